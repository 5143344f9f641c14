use std::convert::Infallible;

use http_body_util::Full;
use hyper::{body::Bytes, header::HeaderValue, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tower::{service_fn, ServiceBuilder, ServiceExt};
use tower_negotiate::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "params")]
struct Person {
    name: String,
    age: u32,
    location: Location,
}

#[derive(Debug, Serialize, Deserialize)]
struct Location {
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "response")]
struct Reply {
    ok: bool,
    person: Person,
}

/// Bind the request, then answer in whatever format the client accepts,
/// falling back to HTML
async fn handle(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let (format, person) = bind::<Person, _>(&parts, body).await;
    let person = match person {
        Ok(person) => person,
        Err(err) => {
            let mut sink = ResponseSink::new().status(err.status_hint());
            sink.push(format!("{format}: {err}\n").as_bytes());
            return Ok(sink.into_response());
        }
    };

    let reply = Reply { ok: true, person };
    let mut sink = ResponseSink::new();
    let written = write_or_else(&mut sink, &parts, &reply, |sink| {
        sink.set_content_type(HeaderValue::from_static("text/html"));
        sink.push(
            format!(
                "<h1>OK: {}</h1>\n<pre>\nname: {}\nage: {}\naddress: {}\n</pre>\n",
                reply.ok, reply.person.name, reply.person.age, reply.person.location.address
            )
            .as_bytes(),
        );
        Ok(())
    });

    if let Err(err) = written {
        let mut sink = ResponseSink::new().status(StatusCode::INTERNAL_SERVER_ERROR);
        sink.push(err.to_string().as_bytes());
        return Ok(sink.into_response());
    }
    Ok(sink.into_response())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let service = ServiceBuilder::new()
        .layer(
            NegotiationLayer::default()
                .with_config(NegotiatorConfig::new().with_max_body_size(64 * 1024)),
        )
        .service(service_fn(handle));

    let requests = [
        (
            "application/json",
            "text/yaml",
            r#"{"name":"Bob","age":22,"location":{"address":"internets"}}"#,
        ),
        (
            "application/x-www-form-urlencoded",
            "application/xml",
            "name=Bob&age=22&location.address=internets",
        ),
        (
            "text/yaml",
            "text/html",
            "name: Bob\nage: 22\nlocation:\n  address: internets\n",
        ),
        ("text/csv", "application/json", "Bob,22,internets"),
    ];

    for (content_type, accept, body) in requests {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("Content-Type", content_type)
            .header("Accept", accept)
            .body(Full::new(Bytes::from_static(body.as_bytes())))?;

        let response = service.clone().oneshot(request).await?;
        let status = response.status();
        let returned = response
            .headers()
            .get("Content-Type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-")
            .to_owned();
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await?
            .to_bytes();

        println!("{content_type} -> {accept}: {status} ({returned})");
        println!("{}", String::from_utf8_lossy(&body));
    }

    Ok(())
}
