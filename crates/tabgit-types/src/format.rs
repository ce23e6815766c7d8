use serde::{Deserialize, Serialize};

/// Horizontal text alignment within a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Optional per-cell presentation attributes.
///
/// Every field is optional; an absent field means "inherit the default".
/// Unset fields are omitted from serialization so that two formats with the
/// same set fields always produce the same canonical form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl CellFormat {
    /// Returns `true` if no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.background_color.is_none()
            && self.text_color.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.font_size.is_none()
            && self.number_format.is_none()
            && self.align.is_none()
    }

    /// Shallow merge: `self`'s set fields win, `base` fills the gaps.
    pub fn overlay(&self, base: &CellFormat) -> CellFormat {
        CellFormat {
            background_color: self
                .background_color
                .clone()
                .or_else(|| base.background_color.clone()),
            text_color: self.text_color.clone().or_else(|| base.text_color.clone()),
            bold: self.bold.or(base.bold),
            italic: self.italic.or(base.italic),
            font_size: self.font_size.or(base.font_size),
            number_format: self
                .number_format
                .clone()
                .or_else(|| base.number_format.clone()),
            align: self.align.or(base.align),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(CellFormat::default().is_empty());
    }

    #[test]
    fn set_field_not_empty() {
        let fmt = CellFormat {
            bold: Some(true),
            ..Default::default()
        };
        assert!(!fmt.is_empty());
    }

    #[test]
    fn unset_fields_omitted_from_json() {
        let fmt = CellFormat {
            background_color: Some("#FFFF99".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&fmt).unwrap();
        assert_eq!(json, "{\"background_color\":\"#FFFF99\"}");
    }

    #[test]
    fn overlay_prefers_self() {
        let top = CellFormat {
            bold: Some(true),
            text_color: Some("#000000".into()),
            ..Default::default()
        };
        let base = CellFormat {
            bold: Some(false),
            background_color: Some("#FFFFFF".into()),
            ..Default::default()
        };
        let merged = top.overlay(&base);
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.text_color.as_deref(), Some("#000000"));
        // Gap filled from base.
        assert_eq!(merged.background_color.as_deref(), Some("#FFFFFF"));
    }

    #[test]
    fn align_roundtrip() {
        let fmt = CellFormat {
            align: Some(TextAlign::Center),
            ..Default::default()
        };
        let json = serde_json::to_string(&fmt).unwrap();
        assert_eq!(json, "{\"align\":\"center\"}");
        let parsed: CellFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.align, Some(TextAlign::Center));
    }
}
