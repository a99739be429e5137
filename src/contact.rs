use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Structured contact input. First and last name are mandatory; everything
/// else may be blank but still gets its marker line in the output block.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

impl ContactRecord {
    /// Serialize to a vCard 3.0 text block, LF line endings, explicit
    /// BEGIN/END markers. Empty optional fields still emit their marker line
    /// so readers see a fixed field layout.
    pub fn vcard_block(&self) -> Result<String, PipelineError> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            return Err(PipelineError::Validation(
                "contact requires both first_name and last_name".to_string(),
            ));
        }

        let mut vcard = String::from("BEGIN:VCARD\nVERSION:3.0\n");
        vcard.push_str(&format!("N:{};{}\n", last, first));
        vcard.push_str(&format!("FN:{} {}\n", first, last));
        vcard.push_str(&format!("ORG:{}\n", self.company.trim()));
        vcard.push_str(&format!("TEL:{}\n", self.phone.trim()));
        vcard.push_str(&format!("EMAIL:{}\n", self.email.trim()));
        vcard.push_str(&format!("URL:{}\n", self.website.trim()));
        vcard.push_str(&format!("ADR:{}\n", self.address.trim()));
        vcard.push_str(&format!("NOTE:{}\n", self.notes.trim()));
        vcard.push_str("END:VCARD");
        Ok(vcard)
    }
}
