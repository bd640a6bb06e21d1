//! Data product credential.

use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use super::format::{
    DATA_PRODUCT_COPYRIGHT_OWNED_BY, DATA_PRODUCT_CREDENTIAL_SUBJECT, DATA_PRODUCT_ISSUER,
    DATA_PRODUCT_PROVIDED_BY, DATA_PRODUCT_VERIFIABLE_CREDENTIAL,
};
use crate::namespace::{DAWEX, GAX_RESOURCE, GAX_SERVICE, SERVICE_DESCRIPTION};
use crate::projector::{Attribute, Field, LinkedDataObject, TypeDescriptor};

/// Identifier of a data product credential: the product within its owning organisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProductId {
    pub data_product_id: String,
    pub organisation_id: String,
}

impl DataProductId {
    pub fn new(data_product_id: impl Into<String>, organisation_id: impl Into<String>) -> Self {
        Self {
            data_product_id: data_product_id.into(),
            organisation_id: organisation_id.into(),
        }
    }

    // organisation first, as the identifier templates expect
    fn to_field(&self) -> Field<'_> {
        Field::Composite(vec![self.organisation_id.as_str(), self.data_product_id.as_str()])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProductVerifiableCredential {
    pub id: Option<DataProductId>,
    pub issuer: Option<String>,
    pub issuance_date: Option<DateTime<Utc>>,
    pub credential_subject: Option<DataProductCredentialSubject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProductCredentialSubject {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub issued: Option<DateTime<Utc>>,
    pub provided_by: Option<String>,
    #[serde(default)]
    pub terms_and_conditions: Vec<String>,
    #[serde(default)]
    pub aggregation_of: Vec<AggregationOf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOf {
    pub id: Option<String>,
    pub copyright_owned_by: Option<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    pub personal_data_policy: Option<PersonalDataPolicy>,
    #[serde(default)]
    pub distributions: Vec<Distribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonalDataPolicy {
    NoPersonalData,
    PersonalData,
}

impl PersonalDataPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPersonalData => "NO_PERSONAL_DATA",
            Self::PersonalData => "PERSONAL_DATA",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub title: Option<String>,
    pub media_type: Option<String>,
    pub byte_size: Option<i64>,
    pub file_hash: Option<String>,
    pub algorithm: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub data_center_location: Option<String>,
}

const DATA_PRODUCT_VC: TypeDescriptor = TypeDescriptor {
    types: &["VerifiableCredential", "ProductCredential"],
    add_base_context: true,
};

const VC_ID: Attribute = Attribute::id().formatted(DATA_PRODUCT_VERIFIABLE_CREDENTIAL);
const VC_ISSUER: Attribute =
    Attribute::new(SERVICE_DESCRIPTION, "issuer").formatted(DATA_PRODUCT_ISSUER);
const VC_ISSUANCE_DATE: Attribute = Attribute::new(SERVICE_DESCRIPTION, "issuanceDate");
const VC_CREDENTIAL_SUBJECT: Attribute = Attribute::new(SERVICE_DESCRIPTION, "credentialSubject");

impl LinkedDataObject for DataProductVerifiableCredential {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &DATA_PRODUCT_VC
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (
                &VC_ID,
                self.id.as_ref().map_or(Field::Absent, DataProductId::to_field),
            ),
            (&VC_ISSUER, self.issuer.as_deref().into()),
            (&VC_ISSUANCE_DATE, self.issuance_date.into()),
            (
                &VC_CREDENTIAL_SUBJECT,
                self.credential_subject
                    .as_ref()
                    .map_or(Field::Absent, Field::object),
            ),
        ]
    }
}

const SUBJECT: TypeDescriptor = TypeDescriptor {
    types: &[],
    add_base_context: false,
};

const SUBJECT_ID: Attribute = Attribute::id().formatted(DATA_PRODUCT_CREDENTIAL_SUBJECT);
const TITLE: Attribute = Attribute::new(DAWEX, "title").mandatory();
const DESCRIPTION: Attribute = Attribute::new(DAWEX, "description");
const ISSUED: Attribute = Attribute::new(DAWEX, "issued").mandatory();
const PROVIDED_BY: Attribute = Attribute::new(GAX_SERVICE, "providedBy")
    .formatted(DATA_PRODUCT_PROVIDED_BY)
    .mandatory();
const TERMS_AND_CONDITIONS: Attribute =
    Attribute::new(GAX_SERVICE, "termsAndConditions").mandatory();
const AGGREGATION_OF: Attribute = Attribute::new(GAX_SERVICE, "aggregationOf").mandatory();

impl LinkedDataObject for DataProductCredentialSubject {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &SUBJECT
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&SUBJECT_ID, self.id.as_deref().into()),
            (&TITLE, self.title.as_deref().into()),
            (&DESCRIPTION, self.description.as_deref().into()),
            (&ISSUED, self.issued.into()),
            (&PROVIDED_BY, self.provided_by.as_deref().into()),
            (&TERMS_AND_CONDITIONS, Field::texts(&self.terms_and_conditions)),
            (&AGGREGATION_OF, Field::objects(&self.aggregation_of)),
        ]
    }
}

const AGGREGATION: TypeDescriptor = TypeDescriptor {
    types: &[],
    add_base_context: false,
};

const IDENTIFIER: Attribute = Attribute::new(DAWEX, "identifier").mandatory();
const COPYRIGHT_OWNED_BY: Attribute = Attribute::new(GAX_RESOURCE, "copyrightOwnedBy")
    .formatted(DATA_PRODUCT_COPYRIGHT_OWNED_BY)
    .mandatory();
const LICENSE: Attribute = Attribute::new(GAX_RESOURCE, "license").mandatory();
const PERSONAL_DATA_POLICY: Attribute = Attribute::new(DAWEX, "personalDataPolicy");
const DISTRIBUTION: Attribute = Attribute::new(DAWEX, "distribution");

impl LinkedDataObject for AggregationOf {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &AGGREGATION
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&IDENTIFIER, self.id.as_deref().into()),
            (&COPYRIGHT_OWNED_BY, self.copyright_owned_by.as_deref().into()),
            (&LICENSE, Field::texts(&self.licenses)),
            (
                &PERSONAL_DATA_POLICY,
                self.personal_data_policy.map(|p| p.as_str()).into(),
            ),
            (&DISTRIBUTION, Field::objects(&self.distributions)),
        ]
    }
}

const DISTRIBUTION_TYPE: TypeDescriptor = TypeDescriptor {
    types: &[],
    add_base_context: false,
};

const DISTRIBUTION_TITLE: Attribute = Attribute::new(DAWEX, "title");
const MEDIA_TYPE: Attribute = Attribute::new(DAWEX, "mediaType");
const BYTE_SIZE: Attribute = Attribute::new(DAWEX, "byteSize");
const FILE_HASH: Attribute = Attribute::new(DAWEX, "fileHash");
const ALGORITHM: Attribute = Attribute::new(DAWEX, "algorithm");
const LOCATION: Attribute = Attribute::new(DAWEX, "location");

impl LinkedDataObject for Distribution {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &DISTRIBUTION_TYPE
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&DISTRIBUTION_TITLE, self.title.as_deref().into()),
            (&MEDIA_TYPE, self.media_type.as_deref().into()),
            (&BYTE_SIZE, self.byte_size.into()),
            (&FILE_HASH, self.file_hash.as_deref().into()),
            (&ALGORITHM, self.algorithm.as_deref().into()),
            (
                &LOCATION,
                self.location.as_ref().map_or(Field::Absent, Field::object),
            ),
        ]
    }
}

const LOCATION_TYPE: TypeDescriptor = TypeDescriptor {
    types: &["gax-service:TrustedCloudServiceOfferingSubCompanies"],
    add_base_context: false,
};

const DATA_CENTER_LOCATION: Attribute = Attribute::new(GAX_SERVICE, "dataCenterLocation");

impl LinkedDataObject for Location {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &LOCATION_TYPE
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![(
            &DATA_CENTER_LOCATION,
            self.data_center_location.as_deref().into(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::format::{credential_projector, DEFAULT_BASE_IRI};
    use crate::error::ErrorKind;
    use serde_json::json;

    fn data_product() -> DataProductVerifiableCredential {
        DataProductVerifiableCredential {
            id: Some(DataProductId::new(
                "62bab5ae84fd784b1541e8f3",
                "62b570acb33e417edcb345ee",
            )),
            issuer: Some("62b570acb33e417ed-issuer".to_string()),
            issuance_date: Some(Utc.with_ymd_and_hms(2022, 8, 4, 0, 0, 0).unwrap()),
            credential_subject: Some(DataProductCredentialSubject {
                id: Some("62bab5ae84fd784-dataproduct".to_string()),
                title: Some("Statistics of road accidents in France".to_string()),
                description: Some(
                    "This publication provides data on road accidents in France.".to_string(),
                ),
                issued: Some(Utc.with_ymd_and_hms(2022, 1, 18, 0, 0, 0).unwrap()),
                provided_by: Some("62b570acb33e417-provider".to_string()),
                terms_and_conditions: vec![
                    "terms".to_string(),
                    "and".to_string(),
                    "conditions".to_string(),
                ],
                aggregation_of: vec![AggregationOf {
                    id: Some("62bac14584fd784b1541e9cb".to_string()),
                    copyright_owned_by: Some("62b570acb33e41-copyright".to_string()),
                    licenses: vec!["MIT".to_string(), "LGPL-3.0".to_string()],
                    personal_data_policy: Some(PersonalDataPolicy::NoPersonalData),
                    distributions: vec![Distribution {
                        title: Some("tangerine.csv".to_string()),
                        media_type: Some("text/csv".to_string()),
                        byte_size: Some(139855),
                        file_hash: Some(
                            "37f5d519788d497dcaaa345ba0cb9629fb13ffe23011eb7751796153985a86fb"
                                .to_string(),
                        ),
                        algorithm: Some("SHA-256".to_string()),
                        location: Some(Location {
                            data_center_location: Some("Europe (Ireland)".to_string()),
                        }),
                    }],
                }],
            }),
        }
    }

    #[test]
    fn project_data_product() {
        let document = credential_projector(DEFAULT_BASE_IRI)
            .project(&data_product())
            .unwrap();
        assert_eq!(
            document.to_json(),
            json!({
                "@context": {
                    "@base": "https://dawex.com",
                    "dw": "https://dawex.com/schemas/dataoffering#",
                    "gax-resource": "https://www.w3id.org/gaia-x/resource#",
                    "gax-service": "https://w3id.org/gaia-x/service#",
                    "sd": "https://www.w3.org/2018/credentials/v1"
                },
                "@id": "./organisations/62b570acb33e417edcb345ee/dataproducts/62bab5ae84fd784b1541e8f3/verifiableCredential",
                "@type": ["VerifiableCredential", "ProductCredential"],
                "sd:issuer": "./organisations/62b570acb33e417ed-issuer",
                "sd:issuanceDate": "2022-08-04T00:00:00Z",
                "sd:credentialSubject": {
                    "@id": "./dataproducts/62bab5ae84fd784-dataproduct",
                    "dw:title": "Statistics of road accidents in France",
                    "dw:description": "This publication provides data on road accidents in France.",
                    "dw:issued": "2022-01-18T00:00:00Z",
                    "gax-service:providedBy": "./organisations/62b570acb33e417-provider/verifiableCredential",
                    "gax-service:termsAndConditions": ["terms", "and", "conditions"],
                    "gax-service:aggregationOf": [{
                        "dw:identifier": "62bac14584fd784b1541e9cb",
                        "gax-resource:copyrightOwnedBy": "./organisations/62b570acb33e41-copyright/verifiableCredential",
                        "gax-resource:license": ["MIT", "LGPL-3.0"],
                        "dw:personalDataPolicy": "NO_PERSONAL_DATA",
                        "dw:distribution": [{
                            "dw:title": "tangerine.csv",
                            "dw:mediaType": "text/csv",
                            "dw:byteSize": 139855,
                            "dw:fileHash": "37f5d519788d497dcaaa345ba0cb9629fb13ffe23011eb7751796153985a86fb",
                            "dw:algorithm": "SHA-256",
                            "dw:location": {
                                "@type": "gax-service:TrustedCloudServiceOfferingSubCompanies",
                                "gax-service:dataCenterLocation": "Europe (Ireland)"
                            }
                        }]
                    }]
                }
            })
        );
    }

    #[test]
    fn empty_licenses_are_missing() {
        let mut data_product = data_product();
        if let Some(subject) = data_product.credential_subject.as_mut() {
            subject.aggregation_of[0].licenses.clear();
        }
        let err = credential_projector(DEFAULT_BASE_IRI)
            .project(&data_product)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMandatoryField);
        assert_eq!(
            err.to_string(),
            "Missing mandatory field: gax-resource:license"
        );
    }

    #[test]
    fn deserialize_from_json() {
        let json = serde_json::to_value(data_product()).unwrap();
        assert_eq!(
            json["credentialSubject"]["aggregationOf"][0]["personalDataPolicy"],
            "NO_PERSONAL_DATA"
        );
        let parsed: DataProductVerifiableCredential = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, data_product());
    }
}
