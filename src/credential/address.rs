use serde::{Deserialize, Serialize};

use crate::namespace::GAX_PARTICIPANT;
use crate::projector::{Attribute, Field, LinkedDataObject, TypeDescriptor};

/// Postal address of a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
}

const ADDRESS: TypeDescriptor = TypeDescriptor {
    types: &[],
    add_base_context: false,
};

const STREET_ADDRESS: Attribute = Attribute::new(GAX_PARTICIPANT, "street-address");
const POSTAL_CODE: Attribute = Attribute::new(GAX_PARTICIPANT, "postal-code");
const REGION: Attribute = Attribute::new(GAX_PARTICIPANT, "region");
const LOCALITY: Attribute = Attribute::new(GAX_PARTICIPANT, "locality");
const COUNTRY_NAME: Attribute = Attribute::new(GAX_PARTICIPANT, "country-name");

impl LinkedDataObject for Address {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &ADDRESS
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&STREET_ADDRESS, self.street_address.as_deref().into()),
            (&POSTAL_CODE, self.postal_code.as_deref().into()),
            (&REGION, self.region.as_deref().into()),
            (&LOCALITY, self.locality.as_deref().into()),
            (&COUNTRY_NAME, self.country_name.as_deref().into()),
        ]
    }
}
