//! Organisation (legal person) credential.

use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use super::format::{
    ORGANISATION_CREDENTIAL_SUBJECT, ORGANISATION_ISSUER, ORGANISATION_VERIFIABLE_CREDENTIAL,
};
use super::Address;
use crate::namespace::{GAX_PARTICIPANT, SERVICE_DESCRIPTION};
use crate::projector::{Attribute, Field, LinkedDataObject, TypeDescriptor};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationVerifiableCredential {
    pub id: Option<String>,
    pub issuer: Option<String>,
    pub issuance_date: Option<DateTime<Utc>>,
    pub credential_subject: Option<OrganisationCredentialSubject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationCredentialSubject {
    pub id: Option<String>,
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub headquarter_address: Option<Address>,
    pub legal_address: Option<Address>,
}

const ORGANISATION_VC: TypeDescriptor = TypeDescriptor {
    types: &["VerifiableCredential", "LegalPerson"],
    add_base_context: true,
};

const VC_ID: Attribute = Attribute::id().formatted(ORGANISATION_VERIFIABLE_CREDENTIAL);
const VC_ISSUER: Attribute =
    Attribute::new(SERVICE_DESCRIPTION, "issuer").formatted(ORGANISATION_ISSUER);
const VC_ISSUANCE_DATE: Attribute = Attribute::new(SERVICE_DESCRIPTION, "issuanceDate");
const VC_CREDENTIAL_SUBJECT: Attribute = Attribute::new(SERVICE_DESCRIPTION, "credentialSubject");

impl LinkedDataObject for OrganisationVerifiableCredential {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &ORGANISATION_VC
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&VC_ID, self.id.as_deref().into()),
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

const ORGANISATION_SUBJECT: TypeDescriptor = TypeDescriptor {
    types: &[],
    add_base_context: false,
};

const SUBJECT_ID: Attribute = Attribute::id().formatted(ORGANISATION_CREDENTIAL_SUBJECT);
const NAME: Attribute = Attribute::new(GAX_PARTICIPANT, "name").mandatory();
const REGISTRATION_NUMBER: Attribute =
    Attribute::new(GAX_PARTICIPANT, "registrationNumber").mandatory();
const HEADQUARTER_ADDRESS: Attribute =
    Attribute::new(GAX_PARTICIPANT, "headquarterAddress").mandatory();
const LEGAL_ADDRESS: Attribute = Attribute::new(GAX_PARTICIPANT, "legalAddress").mandatory();

impl LinkedDataObject for OrganisationCredentialSubject {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        &ORGANISATION_SUBJECT
    }

    fn attributes(&self) -> Vec<(&'static Attribute, Field<'_>)> {
        vec![
            (&SUBJECT_ID, self.id.as_deref().into()),
            (&NAME, self.name.as_deref().into()),
            (&REGISTRATION_NUMBER, self.registration_number.as_deref().into()),
            (
                &HEADQUARTER_ADDRESS,
                self.headquarter_address
                    .as_ref()
                    .map_or(Field::Absent, Field::object),
            ),
            (
                &LEGAL_ADDRESS,
                self.legal_address
                    .as_ref()
                    .map_or(Field::Absent, Field::object),
            ),
        ]
    }
}
