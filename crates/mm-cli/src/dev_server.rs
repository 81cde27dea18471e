//! Local template preview server.
//!
//! Serves a fresh render of the template on every GET so an author can edit
//! the file and refresh the browser. Render failures answer 500 with the
//! error text; the server keeps running so the edit loop survives typos.

use mm_report::Renderer;
use std::path::Path;
use tiny_http::{Header, Response, Server};
use tracing::{info, warn};

pub fn serve(renderer: &Renderer, template_path: &Path, port: u16) -> Result<(), String> {
    let server =
        Server::http(("0.0.0.0", port)).map_err(|e| format!("failed to bind port {port}: {e}"))?;
    let content_type: Header = "Content-Type: text/html; charset=utf-8"
        .parse()
        .map_err(|()| "invalid content-type header".to_string())?;

    info!(port, template = %template_path.display(), "template dev server listening");
    println!("Starting template dev server at http://localhost:{port}");

    for request in server.incoming_requests() {
        let response = match renderer.render_file(template_path) {
            Ok(html) => Response::from_string(html)
                .with_header(content_type.clone())
                .boxed(),
            Err(err) => {
                warn!(error = %err, "render failed");
                Response::from_string(format!("render failed: {err}"))
                    .with_status_code(500)
                    .boxed()
            }
        };
        if let Err(err) = request.respond(response) {
            warn!(error = %err, "failed to write preview response");
        }
    }

    Ok(())
}
