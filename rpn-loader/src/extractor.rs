//! Annotation parsing.

use crate::{common::*, config::LocalizationConfig};
use serde_json::Value;

/// The VOC style annotation document.
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub size: AnnotationSize,
    #[serde(default)]
    pub object: Vec<AnnotationObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnnotationSize {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationObject {
    pub name: String,
    pub bndbox: BndBox,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub difficult: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BndBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// Ground truth of one example in source image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub size: Size<usize>,
    pub boxes: Vec<GroundTruth>,
}

/// Converts annotation bytes into [Decoded] ground truth.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: Arc<LocalizationConfig>,
}

impl Extractor {
    pub fn new(config: Arc<LocalizationConfig>) -> Self {
        Self { config }
    }

    pub fn extract(&self, data: &[u8]) -> Result<Decoded> {
        let annotation: Annotation =
            serde_json::from_slice(data).with_context(|| "unable to parse the annotation")?;
        self.convert(annotation)
    }

    pub fn convert(&self, annotation: Annotation) -> Result<Decoded> {
        let Annotation { size, object } = annotation;
        let size = Size::try_from_wh([size.width, size.height])?;

        let boxes: Vec<_> = object
            .into_iter()
            .enumerate()
            .map(|(index, object)| -> Result<_> {
                let AnnotationObject {
                    name,
                    bndbox,
                    difficult,
                } = object;
                let class = self
                    .config
                    .class_index(&name)
                    .ok_or_else(|| format_err!("unknown class name '{}'", name))
                    .with_context(|| format!("invalid object at index {}", index))?;
                let BndBox {
                    xmin,
                    ymin,
                    xmax,
                    ymax,
                } = bndbox;
                let rect = XYXY::try_from_xyxy([xmin, ymin, xmax, ymax])
                    .with_context(|| format!("invalid bndbox of object at index {}", index))?;

                Ok(Label {
                    rect,
                    class,
                    difficult,
                })
            })
            .try_collect()?;

        trace!(
            "extracted {} objects from a {}x{} annotation",
            boxes.len(),
            size.w(),
            size.h()
        );

        Ok(Decoded { size, boxes })
    }
}

/// Accept booleans, integers and integer strings as a flag.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let flag = match value {
        Value::Bool(flag) => flag,
        Value::Number(number) => {
            let number = number
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("'{}' is not a flag", number)))?;
            number != 0
        }
        Value::String(text) => match text.as_str() {
            "0" | "false" => false,
            "1" | "true" => true,
            _ => return Err(D::Error::custom(format!("'{}' is not a flag", text))),
        },
        Value::Null => false,
        value => {
            return Err(D::Error::custom(format!("'{}' is not a flag", value)));
        }
    };
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImageConfig, LocalizationInit};

    fn extractor() -> Extractor {
        let config = LocalizationInit {
            class_names: vec!["person".into(), "dog".into(), "bicycle".into()],
            ..Default::default()
        }
        .build(ImageConfig::with_size(1000, 1000))
        .unwrap();
        Extractor::new(Arc::new(config))
    }

    #[test]
    fn extract_objects() -> Result<()> {
        let text = r#"{
            "filename": "000001.jpg",
            "size": { "width": 500, "height": 375, "depth": 3 },
            "object": [
                { "name": "dog", "bndbox": { "xmin": 10, "ymin": 20, "xmax": 90, "ymax": 120 },
                  "difficult": false, "truncated": true, "pose": "Left" },
                { "name": "bicycle", "bndbox": { "xmin": 1.5, "ymin": 2, "xmax": 3, "ymax": 4 },
                  "difficult": 1 },
                { "name": "person", "bndbox": { "xmin": 0, "ymin": 0, "xmax": 499, "ymax": 374 } }
            ]
        }"#;
        let decoded = extractor().extract(text.as_bytes())?;

        assert_eq!(decoded.size, Size::from_wh([500, 375]));
        assert_eq!(decoded.boxes.len(), 3);
        assert_eq!(decoded.boxes[0].class, 1);
        assert_eq!(decoded.boxes[0].rect.xyxy(), [10.0, 20.0, 90.0, 120.0]);
        assert!(!decoded.boxes[0].difficult);
        assert_eq!(decoded.boxes[1].class, 2);
        assert!(decoded.boxes[1].difficult);
        assert_eq!(decoded.boxes[2].class, 0);
        assert!(!decoded.boxes[2].difficult);
        Ok(())
    }

    #[test]
    fn extract_without_objects() -> Result<()> {
        let decoded = extractor().extract(br#"{ "size": { "width": 20, "height": 10 } }"#)?;
        assert!(decoded.boxes.is_empty());
        Ok(())
    }

    #[test]
    fn extract_errors() {
        let extractor = extractor();

        assert!(extractor.extract(b"not json").is_err());
        assert!(extractor.extract(br#"{ "object": [] }"#).is_err());

        let unknown_class = r#"{
            "size": { "width": 500, "height": 375 },
            "object": [ { "name": "unicorn", "bndbox": { "xmin": 1, "ymin": 2, "xmax": 3, "ymax": 4 } } ]
        }"#;
        assert!(extractor.extract(unknown_class.as_bytes()).is_err());

        let inverted = r#"{
            "size": { "width": 500, "height": 375 },
            "object": [ { "name": "dog", "bndbox": { "xmin": 30, "ymin": 2, "xmax": 3, "ymax": 4 } } ]
        }"#;
        assert!(extractor.extract(inverted.as_bytes()).is_err());
    }
}
