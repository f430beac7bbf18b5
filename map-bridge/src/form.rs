//! Add/edit form input and the map screen's filter inputs.

use shared_types::{LatLng, ListingDraft, ListingPatch, ListingRecord, SearchCriteria};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill Name, Price and select location on map")]
    MissingData,

    #[error("Price must be a non-negative number, got '{0}'")]
    InvalidPrice(String),
}

/// Raw text as typed into the add/edit screens.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingForm {
    pub name: String,
    pub price: String,
    pub location: String,
    pub available: bool,
}

impl Default for ListingForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: String::new(),
            location: String::new(),
            available: true,
        }
    }
}

impl ListingForm {
    /// Pre-fill the edit screen.
    pub fn from_record(record: &ListingRecord) -> Self {
        Self {
            name: record.name.clone(),
            price: record.price.to_string(),
            location: record.location.clone(),
            available: record.available,
        }
    }

    /// Trimmed name, once both name and price have been filled in.
    fn required_name(&self) -> Result<&str, FormError> {
        let name = self.name.trim();
        if name.is_empty() || self.price.trim().is_empty() {
            return Err(FormError::MissingData);
        }
        Ok(name)
    }

    /// Name, price and a picked location are all required.
    pub fn to_draft(&self, picked: Option<LatLng>) -> Result<ListingDraft, FormError> {
        let name = self.required_name()?;
        let Some(at) = picked else {
            return Err(FormError::MissingData);
        };
        Ok(ListingDraft {
            name: name.to_string(),
            price: self.parsed_price()?,
            lat: Some(at.lat),
            lng: Some(at.lng),
            location: self.location.trim().to_string(),
            available: self.available,
        })
    }

    /// Full set of edited fields; coordinates only when a location is known.
    pub fn to_patch(&self, picked: Option<LatLng>) -> Result<ListingPatch, FormError> {
        let name = self.required_name()?;
        Ok(ListingPatch {
            name: Some(name.to_string()),
            price: Some(self.parsed_price()?),
            lat: picked.map(|p| p.lat),
            lng: picked.map(|p| p.lng),
            location: Some(self.location.trim().to_string()),
            available: Some(self.available),
        })
    }

    fn parsed_price(&self) -> Result<f64, FormError> {
        let raw = self.price.trim();
        match raw.parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
            _ => Err(FormError::InvalidPrice(raw.to_string())),
        }
    }
}

/// Build search criteria from the map screen's two text inputs.
///
/// A blank location is omitted; a max price that is blank or not a number is
/// omitted rather than rejected.
pub fn criteria_from_inputs(location: &str, max_price: &str) -> SearchCriteria {
    let location = location.trim();
    SearchCriteria {
        max_price: max_price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|max| max.is_finite()),
        location: (!location.is_empty()).then(|| location.to_string()),
    }
}
