//! `GET /`: static control page.

use axum::response::Html;

const CONTROL_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>LED Control</title>
</head>
<body>
    <h1>LED Control</h1>
    <button onclick="toggleLED('on')">Turn ON</button>
    <button onclick="toggleLED('off')">Turn OFF</button>
    <p id="status">Connecting...</p>

    <script>
        async function toggleLED(state) {
            await fetch(`/led/${state}`, { method: "POST" });
        }

        const scheme = location.protocol === "https:" ? "wss" : "ws";
        const socket = new WebSocket(`${scheme}://${location.host}/ws`);

        socket.onmessage = function(event) {
            document.getElementById("status").textContent = event.data;
        };
        socket.onclose = function() {
            document.getElementById("status").textContent = "Disconnected";
        };
    </script>
</body>
</html>
"#;

pub async fn control_page() -> Html<&'static str> {
    Html(CONTROL_PAGE)
}
