#![allow(dead_code)]

use std::io::Cursor;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header::CONTENT_TYPE};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_fake_provider(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake provider");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake provider");
    });
    format!("http://{addr}")
}

pub fn png_bytes(shade: u8) -> Vec<u8> {
    let image = RgbaImage::from_pixel(4, 4, Rgba([shade, shade, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn multipart_upload(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "----brandportraitboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("build request")
}

pub async fn read_body(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}
