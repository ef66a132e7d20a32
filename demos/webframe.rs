//! Order Service Example
//!
//! Shows per-request loggers, handler-level enrichment and the error envelope.
//!
//! Run with:
//! ```bash
//! RUST_ENV=dev cargo run --example webframe
//! RUST_ENV=dev RUN_MODE=production cargo run --example webframe  # logs to logs/demo/log
//! ```
//!
//! Then test:
//! ```bash
//! curl http://localhost:8080/orders/7
//! curl http://localhost:8080/orders/0        # BadRequest envelope, logged as error
//! curl http://localhost:8080/orders/404      # plain 404
//! curl http://localhost:8080/orders/500      # unknown error envelope
//! curl http://localhost:8080/live
//! ```

use axum::{Json, extract::Path, http::StatusCode, routing::get};
use serde::Serialize;
use webframe::{
    BadRequestError, Config, Context, FluentRouter, Reply, Result, StandardHttpError, fields,
};

#[derive(Serialize)]
struct Order {
    id: u64,
    item: &'static str,
}

async fn get_order(ctx: Context, Path(id): Path<u64>) -> Reply<Json<Order>> {
    let (logger, _ctx) = ctx.derive_and_enrich(fields!("order_id" => id));
    logger.debug("loading order");

    match id {
        0 => Err(BadRequestError::new("订单号无效")
            .with_english("invalid order id")
            .into()),
        404 => Err(StandardHttpError::new(StatusCode::NOT_FOUND, "not found").into()),
        500 => Err(std::io::Error::other("storage offline").into()),
        _ => {
            logger.info("order loaded");
            Ok(Json(Order { id, item: "coffee" }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // config/{RUST_ENV}.toml, falling back to defaults
    let config = Config::default();
    config.setup_tracing()?;

    FluentRouter::without_state(config)?
        .route("/orders/{id}", get(get_order))
        .setup_middleware()
        .await?
        .start()
        .await
}
