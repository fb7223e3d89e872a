use actix_web::web::{self};

pub mod routes {
    pub mod note;
}

mod dtos {
    pub(crate) mod note;
}

pub fn mount_notes() -> actix_web::Scope {
    web::scope("/notes")
        .service(routes::note::get_notes)
        .service(routes::note::post_note)
        .service(routes::note::patch_note)
        .service(routes::note::delete_note)
}
