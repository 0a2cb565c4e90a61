//! Demo service built on mainspring.
//!
//! ```text
//! mainspring check config.toml    # validate configuration only
//! mainspring server config.toml   # run until SIGINT/SIGTERM
//! ```
//!
//! Serves `GET /hello` on the application connectors and the built-in
//! admin routes (`/ping`, `/healthcheck`, `/metrics`) on the admin ones.

use std::process::ExitCode;

use axum::{extract::Query, routing::get, Json};
use serde::{Deserialize, Serialize};

use mainspring::{Application, Bootstrap, BoxError, DefaultConfiguration, Environment};

struct HelloApplication;

#[derive(Deserialize)]
struct HelloParams {
    name: Option<String>,
}

#[derive(Serialize)]
struct Greeting {
    message: String,
}

async fn hello(Query(params): Query<HelloParams>) -> Json<Greeting> {
    let name = params.name.as_deref().unwrap_or("world");
    Json(Greeting {
        message: format!("Hello, {}!", name),
    })
}

impl Application<DefaultConfiguration> for HelloApplication {
    fn name(&self) -> &str {
        "hello"
    }

    fn run(
        &self,
        _configuration: &DefaultConfiguration,
        environment: &mut Environment,
    ) -> Result<(), BoxError> {
        environment.application().handle("/hello", get(hello));
        environment
            .admin()
            .health_checks()
            .register("hello", || -> Result<(), BoxError> { Ok(()) });
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    mainspring::cli::run(Bootstrap::new(HelloApplication)).await
}
