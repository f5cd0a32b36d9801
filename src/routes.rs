use crate::{
    api::{attendance, extra_shift, holiday, leave_request, payroll, purchase_request, training},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Token-bucket limiter allowing `requests_per_min` per peer IP. Built once
/// and cloned into every worker so they share one bucket.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(replenish_interval_ms(requests_per_min))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {requests_per_min} per minute"))?;
    Ok(Governor::new(&cfg))
}

/// One token comes back every `60s / requests_per_min`, never faster than 1ms.
fn replenish_interval_ms(requests_per_min: u32) -> u64 {
    (60_000 / u64::from(requests_per_min.max(1))).max(1)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, protected_limiter: Arc<Limiter>) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::check_in))
                            .route(web::put().to(attendance::check_out)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/balance (before /leave/{id})
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_request::leave_balance)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/extra-shift")
                    .service(
                        web::resource("").route(web::post().to(extra_shift::create_extra_shift)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(extra_shift::approve_extra_shift)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(extra_shift::reject_extra_shift)),
                    ),
            )
            .service(
                web::scope("/holiday").service(
                    web::resource("")
                        .route(web::get().to(holiday::list_holidays))
                        .route(web::put().to(holiday::upsert_holiday)),
                ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::list_payslips)))
                    // /payroll/base-salary/{employee_id}
                    .service(
                        web::resource("/base-salary/{employee_id}")
                            .route(web::put().to(payroll::upsert_base_salary))
                            .route(web::get().to(payroll::get_base_salary)),
                    )
                    // /payroll/payslip/{employee_id}
                    .service(
                        web::resource("/payslip/{employee_id}")
                            .route(web::get().to(payroll::preview_payslip))
                            .route(web::post().to(payroll::save_payslip)),
                    ),
            )
            .service(
                web::scope("/purchase-request")
                    .service(
                        web::resource("")
                            .route(web::post().to(purchase_request::create_purchase_request)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(purchase_request::get_purchase_request)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(purchase_request::update_status)),
                    )
                    .service(
                        web::resource("/{id}/invoice")
                            .route(web::get().to(purchase_request::get_invoice)),
                    ),
            )
            .service(
                web::scope("/training")
                    // /training/rubric/{stage} (before /training/{employee_id})
                    .service(
                        web::resource("/rubric/{stage}").route(web::get().to(training::get_rubric)),
                    )
                    .service(
                        web::resource("/{employee_id}").route(web::get().to(training::get_progress)),
                    )
                    .service(
                        web::resource("/{employee_id}/evaluation")
                            .route(web::post().to(training::submit_evaluation)),
                    )
                    .service(
                        web::resource("/{employee_id}/deployment")
                            .route(web::post().to(training::assign_deployment)),
                    )
                    .service(
                        web::resource("/{employee_id}/reset")
                            .route(web::put().to(training::reset_application)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_any_configured_rate() {
        assert!(build_limiter(1000).is_ok());
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }

    #[test]
    fn replenish_interval_follows_the_per_minute_rate() {
        assert_eq!(replenish_interval_ms(60), 1_000);
        assert_eq!(replenish_interval_ms(1000), 60);
        assert_eq!(replenish_interval_ms(0), 60_000);
        assert_eq!(replenish_interval_ms(120_000), 1);
    }
}
