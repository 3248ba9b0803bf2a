// Route exports
pub mod chat;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(chat::configure),
    )
    .route("/ws", web::get().to(chat::chat_socket));
}
