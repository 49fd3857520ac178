//! Modality dispatch for the extract, transform and load stages.

use crate::{
    common::*,
    config::LocalizationConfig,
    extractor::{Decoded, Extractor},
    packer::{OutputBuffers, Packer},
    params::ImageParams,
    transformer::{Transformed, Transformer},
};

/// The three stages run for every example of a modality.
pub trait Etl {
    type Decoded;
    type Transformed;
    type Buffers;

    fn extract(&self, data: &[u8]) -> Result<Self::Decoded>;

    fn transform(&self, params: &ImageParams, decoded: &Self::Decoded)
        -> Result<Self::Transformed>;

    fn load(&self, transformed: &Self::Transformed, buffers: &mut Self::Buffers);
}

/// Region proposal targets from bounding box annotations.
#[derive(Debug, Clone)]
pub struct LocalizationEtl {
    extractor: Extractor,
    transformer: Transformer,
    packer: Packer,
}

impl LocalizationEtl {
    pub fn new(config: Arc<LocalizationConfig>) -> Self {
        Self {
            extractor: Extractor::new(config.clone()),
            transformer: Transformer::new(config.clone()),
            packer: Packer::new(config),
        }
    }

    pub fn config(&self) -> &LocalizationConfig {
        self.transformer.config()
    }
}

impl Etl for LocalizationEtl {
    type Decoded = Decoded;
    type Transformed = Transformed;
    type Buffers = OutputBuffers;

    fn extract(&self, data: &[u8]) -> Result<Decoded> {
        self.extractor.extract(data)
    }

    fn transform(&self, params: &ImageParams, decoded: &Decoded) -> Result<Transformed> {
        self.transformer.transform(params, decoded)
    }

    fn load(&self, transformed: &Transformed, buffers: &mut OutputBuffers) {
        self.packer.pack(transformed, buffers.slices());
    }
}

/// Names of the supported modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum ModalityKind {
    #[strum(serialize = "localization")]
    Localization,
}

/// A modality pipeline selected by name.
#[derive(Debug, Clone)]
pub enum Provider {
    Localization(LocalizationEtl),
}

impl Provider {
    pub fn new(kind: ModalityKind, config: Arc<LocalizationConfig>) -> Self {
        match kind {
            ModalityKind::Localization => Self::Localization(LocalizationEtl::new(config)),
        }
    }

    pub fn from_name(name: &str, config: Arc<LocalizationConfig>) -> Result<Self> {
        let kind = ModalityKind::from_str(name)
            .map_err(|_| format_err!("unsupported modality '{}'", name))?;
        Ok(Self::new(kind, config))
    }

    pub fn kind(&self) -> ModalityKind {
        match self {
            Self::Localization(_) => ModalityKind::Localization,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Localization(_) => "localization",
        }
    }

    /// Run extract, transform and load on one example.
    pub fn provide(
        &self,
        data: &[u8],
        params: &ImageParams,
        buffers: &mut OutputBuffers,
    ) -> Result<()> {
        match self {
            Self::Localization(etl) => {
                let decoded = etl.extract(data)?;
                let transformed = etl.transform(params, &decoded)?;
                etl.load(&transformed, buffers);
            }
        }
        Ok(())
    }
}
