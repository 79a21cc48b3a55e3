pub mod comparison;
pub mod consistency;
pub mod dataset;
pub mod interval;
pub mod merge;
pub mod month;
pub mod point;
pub mod provider;
pub mod reconcile;
pub mod reference;
pub mod series;
pub mod tax;
