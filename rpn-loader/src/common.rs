pub use anyhow::{ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, CropBox, Size, Transform, XYXY};
pub use getset::{CopyGetters, Getters};
pub use indexmap::IndexSet;
pub use itertools::{iproduct, izip, Itertools as _};
pub use label::Label;
pub use log::{debug, info, trace, warn};
pub use ndarray::Array2;
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
pub use std::{fmt, path::Path, str::FromStr, sync::Arc};
pub use strum::{AsRefStr, Display, EnumString};

/// A ground truth object in pixel coordinates with its class index.
pub type GroundTruth = Label<XYXY<f32>, usize>;
