//! Credential schemas: organisations and the data products they provide.

mod address;
pub mod data_product;
pub mod format;
pub mod organisation;

pub use address::Address;
pub use data_product::{
    AggregationOf, DataProductCredentialSubject, DataProductId, DataProductVerifiableCredential,
    Distribution, Location, PersonalDataPolicy,
};
pub use format::{credential_projector, default_formats};
pub use organisation::{OrganisationCredentialSubject, OrganisationVerifiableCredential};
