use crate::api::account::{
    AccountLedgerResponse, AccountListResponse, CreateAccount, SummaryQuery, UpdateAccount,
};
use crate::api::batch::{BatchDeleted, ExpiringQuery, ExpiringResponse, UpdateBatch};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, PagePermissions};
use crate::api::expense::{
    CategoryTotal, CreateExpense, ExpenseListResponse, ExpenseQuery, ExpenseSummary,
};
use crate::api::health::HealthResponse;
use crate::api::journal::{
    CreateJournalEntry, JournalEntryView, JournalLineView, JournalListResponse,
};
use crate::api::payable::{CreateVendorBill, VendorBillListResponse, VendorBillView};
use crate::api::payroll::{
    CreatePayroll, PaginatedPayrollResponse, PayrollCreated, PayrollQuery, UpdatePayroll,
    UpdatePayrollStatus,
};
use crate::api::product::{
    BatchChange, CreateBatch, CreateProduct, ProductListResponse, ProductQuery, SyncResult,
};
use crate::api::receivable::{CreateInvoice, InvoiceListResponse, InvoiceView};
use crate::api::settlement::{DocumentQuery, PaymentResult, RecordPayment};
use crate::api::shipment::{
    CreateShipment, ShipmentListResponse, ShipmentQuery, UpdateShipmentStatus,
};
use crate::api::warehouse::CreateWarehouse;
use crate::domain::aging::{AgingBucket, AgingLine, AgingReport, BucketTotal};
use crate::domain::inventory::{BatchSyncStatus, ExpiryNotice, StockReconciliation};
use crate::domain::ledger::{
    AccountType, BalanceReconciliation, EntryLine, LedgerRow, LedgerSummary, TypeTotal,
};
use crate::domain::payment::DocumentStatus;
use crate::domain::payroll::{PayBreakdown, PayType, PayrollStatus};
use crate::domain::shipment::ShipmentStatus;
use crate::model::account::Account;
use crate::model::employee::Employee;
use crate::model::expense::Expense;
use crate::model::payroll::PayrollEntry;
use crate::model::product::{Product, ProductBatch};
use crate::model::settlement::Payment;
use crate::model::shipment::Shipment;
use crate::model::warehouse::Warehouse;
use crate::models::{AsOfQuery, MessageResponse, PageQuery};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse ERP API",
        version = "1.0.0",
        description = r#"
## Warehouse Management & Finance

Back office for one or more warehouses: staff, books, inventory and outbound freight.

### Key Features
- **Employees**
  - Create, update, list and view staff with page-level permissions
- **Chart of Accounts & Journal**
  - Balanced double-entry postings, running-balance ledgers, drift reconciliation
- **Payables & Receivables**
  - Vendor bills and customer invoices, partial payments, aging buckets
- **Expenses**
  - Categorised spend with per-category totals
- **Payroll**
  - Gross/deduction/net computation, draft → processed → paid lifecycle, CSV export
- **Inventory**
  - Products, batches with expiry tracking, batch-vs-stock reconciliation and sync
- **Shipments**
  - Pending → packed → shipped → delivered with cancellation before dispatch

### Response Format
- JSON bodies, errors as `{"message": "..."}`
- Pagination on list endpoints via `page` and `per_page`
"#,
    ),
    paths(
        crate::api::health::health,

        crate::api::warehouse::create_warehouse,
        crate::api::warehouse::list_warehouses,
        crate::api::warehouse::get_warehouse,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,

        crate::api::account::create_account,
        crate::api::account::list_accounts,
        crate::api::account::get_account,
        crate::api::account::update_account,
        crate::api::account::account_ledger,
        crate::api::account::reconcile_account,
        crate::api::account::repair_account_balance,
        crate::api::account::account_summary,

        crate::api::journal::post_journal_entry,
        crate::api::journal::list_journal_entries,

        crate::api::payable::create_bill,
        crate::api::payable::list_bills,
        crate::api::payable::get_bill,
        crate::api::payable::record_bill_payment,
        crate::api::payable::list_bill_payments,
        crate::api::payable::payables_aging,

        crate::api::receivable::create_invoice,
        crate::api::receivable::list_invoices,
        crate::api::receivable::get_invoice,
        crate::api::receivable::record_invoice_payment,
        crate::api::receivable::list_invoice_payments,
        crate::api::receivable::receivables_aging,

        crate::api::expense::create_expense,
        crate::api::expense::list_expenses,
        crate::api::expense::expense_summary,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::update_payroll_status,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::export_payroll,

        crate::api::product::create_product,
        crate::api::product::list_products,
        crate::api::product::get_product,
        crate::api::product::list_batches,
        crate::api::product::create_batch,
        crate::api::product::reconcile_product,
        crate::api::product::sync_product_stock,

        crate::api::batch::update_batch,
        crate::api::batch::delete_batch,
        crate::api::batch::expiring_batches,

        crate::api::shipment::create_shipment,
        crate::api::shipment::list_shipments,
        crate::api::shipment::get_shipment,
        crate::api::shipment::update_shipment_status
    ),
    components(
        schemas(
            MessageResponse,
            PageQuery,
            AsOfQuery,
            HealthResponse,
            Warehouse,
            CreateWarehouse,
            Employee,
            CreateEmployee,
            PagePermissions,
            EmployeeQuery,
            EmployeeListResponse,
            PayType,
            Account,
            AccountType,
            CreateAccount,
            UpdateAccount,
            AccountListResponse,
            AccountLedgerResponse,
            SummaryQuery,
            LedgerRow,
            BalanceReconciliation,
            TypeTotal,
            LedgerSummary,
            EntryLine,
            CreateJournalEntry,
            JournalLineView,
            JournalEntryView,
            JournalListResponse,
            DocumentStatus,
            DocumentQuery,
            RecordPayment,
            PaymentResult,
            Payment,
            AgingBucket,
            AgingLine,
            BucketTotal,
            AgingReport,
            CreateVendorBill,
            VendorBillView,
            VendorBillListResponse,
            CreateInvoice,
            InvoiceView,
            InvoiceListResponse,
            Expense,
            CreateExpense,
            ExpenseQuery,
            ExpenseListResponse,
            CategoryTotal,
            ExpenseSummary,
            PayrollEntry,
            PayrollStatus,
            PayBreakdown,
            CreatePayroll,
            UpdatePayroll,
            UpdatePayrollStatus,
            PayrollQuery,
            PayrollCreated,
            PaginatedPayrollResponse,
            Product,
            ProductBatch,
            CreateProduct,
            ProductQuery,
            ProductListResponse,
            CreateBatch,
            UpdateBatch,
            BatchChange,
            BatchDeleted,
            BatchSyncStatus,
            StockReconciliation,
            SyncResult,
            ExpiringQuery,
            ExpiryNotice,
            ExpiringResponse,
            Shipment,
            ShipmentStatus,
            CreateShipment,
            UpdateShipmentStatus,
            ShipmentQuery,
            ShipmentListResponse
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Warehouse", description = "Warehouse registry"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Accounts", description = "Chart of accounts, ledgers and reconciliation"),
        (name = "Journal", description = "Double-entry journal postings"),
        (name = "Accounts Payable", description = "Vendor bills, payments and aging"),
        (name = "Accounts Receivable", description = "Customer invoices, payments and aging"),
        (name = "Expenses", description = "Operating expenses"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Inventory", description = "Products, batches and stock reconciliation"),
        (name = "Shipments", description = "Outbound shipment tracking"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_paths_are_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/accounts/summary",
            "/api/payables/aging",
            "/api/receivables/aging",
            "/api/payroll/export",
            "/api/batches/expiring",
            "/api/products/{product_id}/sync",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
