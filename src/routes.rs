use crate::{
    api::{
        account, batch, employee, expense, health, journal, payable, payroll, product, receivable,
        shipment, warehouse,
    },
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::anyhow;

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter shared by every worker: the quota lives behind the
/// config's Arc, so each `Governor::new` draws from the same bucket.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {} requests/min", requests_per_min))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .service(web::resource("/health").route(web::get().to(health::health)))
            .service(
                web::scope("/warehouses")
                    .service(
                        web::resource("")
                            .route(web::post().to(warehouse::create_warehouse))
                            .route(web::get().to(warehouse::list_warehouses)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(warehouse::get_warehouse)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}, no delete: employees are deactivated instead
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee)),
                    ),
            )
            .service(
                web::scope("/accounts")
                    .service(
                        web::resource("")
                            .route(web::post().to(account::create_account))
                            .route(web::get().to(account::list_accounts)),
                    )
                    .service(
                        web::resource("/summary").route(web::get().to(account::account_summary)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(account::get_account))
                            .route(web::put().to(account::update_account)),
                    )
                    .service(
                        web::resource("/{id}/ledger").route(web::get().to(account::account_ledger)),
                    )
                    .service(
                        web::resource("/{id}/reconcile")
                            .route(web::get().to(account::reconcile_account))
                            .route(web::post().to(account::repair_account_balance)),
                    ),
            )
            .service(
                web::resource("/journal")
                    .route(web::post().to(journal::post_journal_entry))
                    .route(web::get().to(journal::list_journal_entries)),
            )
            .service(
                web::scope("/payables")
                    .service(
                        web::resource("")
                            .route(web::post().to(payable::create_bill))
                            .route(web::get().to(payable::list_bills)),
                    )
                    .service(web::resource("/aging").route(web::get().to(payable::payables_aging)))
                    .service(web::resource("/{id}").route(web::get().to(payable::get_bill)))
                    .service(
                        web::resource("/{id}/payments")
                            .route(web::post().to(payable::record_bill_payment))
                            .route(web::get().to(payable::list_bill_payments)),
                    ),
            )
            .service(
                web::scope("/receivables")
                    .service(
                        web::resource("")
                            .route(web::post().to(receivable::create_invoice))
                            .route(web::get().to(receivable::list_invoices)),
                    )
                    .service(
                        web::resource("/aging").route(web::get().to(receivable::receivables_aging)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(receivable::get_invoice)))
                    .service(
                        web::resource("/{id}/payments")
                            .route(web::post().to(receivable::record_invoice_payment))
                            .route(web::get().to(receivable::list_invoice_payments)),
                    ),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::post().to(expense::create_expense))
                            .route(web::get().to(expense::list_expenses)),
                    )
                    .service(
                        web::resource("/summary").route(web::get().to(expense::expense_summary)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    // /payroll/export must win over /payroll/{id}
                    .service(web::resource("/export").route(web::get().to(payroll::export_payroll)))
                    // /payroll/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(payroll::update_payroll_status)),
                    ),
            )
            .service(
                web::scope("/products")
                    .service(
                        web::resource("")
                            .route(web::post().to(product::create_product))
                            .route(web::get().to(product::list_products)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(product::get_product)))
                    .service(
                        web::resource("/{id}/batches")
                            .route(web::get().to(product::list_batches))
                            .route(web::post().to(product::create_batch)),
                    )
                    .service(
                        web::resource("/{id}/reconcile")
                            .route(web::get().to(product::reconcile_product)),
                    )
                    .service(
                        web::resource("/{id}/sync").route(web::post().to(product::sync_product_stock)),
                    ),
            )
            .service(
                web::scope("/batches")
                    .service(
                        web::resource("/expiring").route(web::get().to(batch::expiring_batches)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(batch::update_batch))
                            .route(web::delete().to(batch::delete_batch)),
                    ),
            )
            .service(
                web::scope("/shipments")
                    .service(
                        web::resource("")
                            .route(web::post().to(shipment::create_shipment))
                            .route(web::get().to(shipment::list_shipments)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(shipment::get_shipment)))
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(shipment::update_shipment_status)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_edge_rates() {
        assert!(build_limiter(1000).is_ok());
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
