// src/server/client.rs

/// Path of the live-reload WebSocket endpoint.
pub const WS_PATH: &str = "/__assetpipe/ws";

/// Path the client script is served from.
pub const CLIENT_PATH: &str = "/__assetpipe/livereload.js";

/// Tag injected into served HTML pages.
pub const CLIENT_TAG: &str = r#"<script src="/__assetpipe/livereload.js"></script>"#;

/// Browser side of the live-reload protocol.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var proto = location.protocol === "https:" ? "wss:" : "ws:";
  var url = proto + "//" + location.host + "/__assetpipe/ws";

  function swapCss(paths) {
    var names = paths.map(function (p) { return p.split("/").pop(); });
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    Array.prototype.forEach.call(links, function (link) {
      var href = new URL(link.href);
      var file = href.pathname.split("/").pop();
      if (names.length === 0 || names.indexOf(file) !== -1) {
        href.searchParams.set("__assetpipe", Date.now().toString());
        link.href = href.toString();
      }
    });
  }

  function connect() {
    var socket = new WebSocket(url);
    socket.onmessage = function (event) {
      var msg;
      try { msg = JSON.parse(event.data); } catch (e) { return; }
      if (msg.type === "reload") {
        location.reload();
      } else if (msg.type === "css") {
        swapCss(msg.paths || []);
      }
    };
    socket.onclose = function () { setTimeout(connect, 1000); };
  }

  connect();
})();
"#;

/// Insert the client tag before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + CLIENT_TAG.len());
            out.push_str(&html[..idx]);
            out.push_str(CLIENT_TAG);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{CLIENT_TAG}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_closing_body() {
        let html = "<html><BODY><p>hi</p></BODY></html>";
        let out = inject_client(html);
        assert_eq!(
            out,
            format!("<html><BODY><p>hi</p>{CLIENT_TAG}</BODY></html>")
        );
    }

    #[test]
    fn appends_without_body() {
        assert_eq!(inject_client("<p>x</p>"), format!("<p>x</p>{CLIENT_TAG}"));
    }
}
