pub mod account;
pub mod batch;
pub mod employee;
pub mod expense;
pub mod health;
pub mod journal;
pub mod payable;
pub mod payroll;
pub mod product;
pub mod receivable;
pub mod settlement;
pub mod shipment;
pub mod warehouse;
