use actix_web::web::{self};

pub mod routes {
    pub mod sub;
    pub mod webhook;
}

mod services {
    pub(crate) mod checkout;
    pub(crate) mod sync;
}

mod dtos {
    pub(crate) mod sub;
}

pub fn mount_subs() -> actix_web::Scope {
    web::scope("/subs")
        .service(routes::sub::get_plans)
        .service(routes::sub::get_subscription)
        .service(routes::sub::get_checkout_status)
        .service(routes::sub::post_checkout)
        .service(routes::sub::post_portal)
}

pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/pay").service(routes::webhook::post_webhook)
}
