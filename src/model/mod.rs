pub mod account;
pub mod employee;
pub mod expense;
pub mod journal;
pub mod payroll;
pub mod product;
pub mod settlement;
pub mod shipment;
pub mod warehouse;
