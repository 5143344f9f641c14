//! Process-wide default registries
//!
//! Kept in its own test binary so the mutations below cannot race with
//! tests that rely on the built-in defaults.

use http_body_util::Full;
use hyper::{body::Bytes, Request};
use serde::{Deserialize, Serialize};
use tower_negotiate::{
    codec::{JsonFormat, XmlFormat},
    default_decoders, default_encoders, set_default_decoders, update_default_encoders,
    DecoderRegistry, ResponseSink,
};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Ping {
    seq: u32,
}

#[tokio::test]
async fn test_replacing_defaults() {
    let before = default_encoders();
    assert_eq!(before.tokens().collect::<Vec<_>>(), ["xml", "json", "yaml"]);

    // JSON first, XML last, YAML gone
    update_default_encoders(|encoders| {
        encoders.remove("yaml");
        encoders.remove("xml");
        encoders.insert("xml", XmlFormat);
    });
    assert_eq!(default_encoders().tokens().collect::<Vec<_>>(), ["json", "xml"]);

    // Snapshots taken earlier are unaffected
    assert_eq!(before.len(), 3);

    let (parts, ()) = Request::builder()
        .header("Accept", "application/xml, application/json")
        .body(())
        .unwrap()
        .into_parts();
    let mut sink = ResponseSink::new();
    tower_negotiate::write(&mut sink, &parts, &Ping { seq: 1 }).unwrap();
    assert_eq!(sink.body(), b"{\"seq\":1}\n");

    set_default_decoders(DecoderRegistry::new().with("json", JsonFormat));
    assert_eq!(default_decoders().len(), 1);

    let (parts, body) = Request::builder()
        .header("Content-Type", "application/xml")
        .body(Full::new(Bytes::from_static(b"<Ping><seq>1</seq></Ping>")))
        .unwrap()
        .into_parts();
    let (format, result) = tower_negotiate::bind::<Ping, _>(&parts, body).await;
    assert_eq!(format, "application/xml");
    assert!(result.unwrap_err().is_invalid_format());
}
