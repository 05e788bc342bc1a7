//! Dataset loading and external lookups.
//!
//! CSV readers for the side-effect dataset and the auxiliary off-label
//! category table, plus the PubChem compound-to-SMILES resolver used to
//! join the latter against structures.
pub mod pubchem;
pub mod sider_csv;

pub use pubchem::PubChemClient;
pub use sider_csv::{
    build_offside_dataset, read_offsides_csv, read_sider_csv, OffsideRecord, SiderDataset,
    SmilesResolver,
};
