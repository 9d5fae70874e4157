//! Freighter pages HTML
//!
//! Self-contained pages that talk to the Freighter extension through its
//! browser API bundle and post the outcome back to `/callback/{id}`.

/// Freighter browser API bundle (exposes `window.freighterApi`)
const FREIGHTER_API_SCRIPT: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/stellar-freighter-api/2.0.0/index.min.js";

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #0b1026 0%, #13203f 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            color: #fff;
        }
        .container {
            background: rgba(255,255,255,0.05);
            border-radius: 16px;
            padding: 40px;
            max-width: 480px;
            width: 90%;
            text-align: center;
            border: 1px solid rgba(255,255,255,0.1);
        }
        h1 { font-size: 24px; margin-bottom: 8px; }
        .message { color: rgba(255,255,255,0.7); margin-bottom: 32px; font-size: 14px; }
        .status {
            padding: 20px;
            border-radius: 8px;
            margin-bottom: 24px;
            font-size: 16px;
        }
        .status.loading { background: rgba(59, 130, 246, 0.2); }
        .status.success { background: rgba(34, 197, 94, 0.2); }
        .status.error { background: rgba(239, 68, 68, 0.2); }
        .mono { font-family: monospace; font-size: 12px; word-break: break-all; margin-top: 12px; }
        .hidden { display: none; }
        a { color: #3b82f6; }
"#;

/// Shared page script: status helpers, callback poster, extension detection
fn common_script(request_id: &str, token: &str, base_url: &str) -> String {
    let token = escape_js_string(token);
    format!(
        r#"
        const REQUEST_ID = "{request_id}";
        const REQUEST_TOKEN = "{token}";
        const BASE_URL = "{base_url}";
        const statusEl = document.getElementById('status');
        const installPrompt = document.getElementById('install-prompt');

        function setStatus(text, type) {{
            statusEl.textContent = text;
            statusEl.className = 'status ' + type;
        }}

        async function report(body) {{
            await fetch(BASE_URL + '/callback/' + REQUEST_ID, {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json', 'X-Relay-Token': REQUEST_TOKEN }},
                body: JSON.stringify(body)
            }});
        }}

        function isDeclined(message) {{
            const m = (message || '').toLowerCase();
            return m.includes('declined') || m.includes('rejected') || m.includes('denied');
        }}

        async function detect() {{
            await new Promise(r => setTimeout(r, 300));
            const api = window.freighterApi;
            if (!api || !(await api.isConnected())) {{
                setStatus('Freighter extension not found. Please install it.', 'error');
                installPrompt.classList.remove('hidden');
                await report({{ extensionPresent: false }});
                return null;
            }}
            return api;
        }}

        async function fail(error) {{
            const message = (error && (error.message || error)) || 'Unknown error';
            setStatus(message, 'error');
            await report({{ error: String(message), declined: isDeclined(String(message)), extensionPresent: true }});
        }}
"#,
        request_id = escape_js_string(request_id),
        base_url = escape_js_string(base_url),
    )
}

fn page(title: &str, heading: &str, message: &str, body_script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - XHedge</title>
    <style>{style}</style>
    <script src="{api}"></script>
</head>
<body>
    <div class="container">
        <h1>{heading}</h1>
        <p class="message" id="message"></p>
        <div id="status" class="status loading">Checking for Freighter...</div>
        <div id="result" class="mono hidden"></div>
        <div id="install-prompt" class="hidden">
            <a href="https://www.freighter.app/" target="_blank">Install Freighter</a>
        </div>
    </div>
    <script>
        document.getElementById('message').textContent = "{message}";
{script}
    </script>
</body>
</html>"#,
        title = title,
        heading = heading,
        style = STYLE,
        api = FREIGHTER_API_SCRIPT,
        message = escape_js_string(message),
        script = body_script,
    )
}

/// Connect page: grant access, read the public key, post `{publicKey}`
pub fn generate_connect_page(request_id: &str, token: &str, base_url: &str) -> String {
    let script = format!(
        r#"{common}
        async function connect() {{
            try {{
                const api = await detect();
                if (!api) return;

                setStatus('Please approve access in Freighter...', 'loading');
                const allowed = (await api.isAllowed()) || (await api.setAllowed());
                if (!allowed) {{
                    await fail('User declined access');
                    return;
                }}
                const publicKey = await api.getPublicKey();
                if (!publicKey) {{
                    await fail('User declined access');
                    return;
                }}

                await report({{ publicKey: publicKey, extensionPresent: true, allowed: true }});
                setStatus('Wallet connected', 'success');
                const result = document.getElementById('result');
                result.textContent = publicKey;
                result.classList.remove('hidden');
                setTimeout(() => {{ try {{ window.close(); }} catch (e) {{}} }}, 2000);
            }} catch (error) {{
                await fail(error);
            }}
        }}

        connect();
"#,
        common = common_script(request_id, token, base_url)
    );
    page(
        "Connect Wallet",
        "Connect Wallet",
        "Connect your Freighter wallet to XHedge",
        &script,
    )
}

/// Signing page: fetch the envelope, sign it, post `{signedTxXdr}`
pub fn generate_signing_page(
    request_id: &str,
    token: &str,
    message: &str,
    base_url: &str,
) -> String {
    let script = format!(
        r#"{common}
        async function sign() {{
            try {{
                const api = await detect();
                if (!api) return;

                setStatus('Fetching transaction...', 'loading');
                const response = await fetch(BASE_URL + '/request/' + REQUEST_ID, {{
                    headers: {{ 'X-Relay-Token': REQUEST_TOKEN }}
                }});
                if (!response.ok) {{
                    setStatus('Request is no longer available', 'error');
                    return;
                }}
                const request = await response.json();

                setStatus('Please approve the transaction in Freighter...', 'loading');
                const signed = await api.signTransaction(request.unsignedTxXdr, {{
                    networkPassphrase: request.networkPassphrase
                }});

                await report({{ signedTxXdr: signed, extensionPresent: true }});
                setStatus('Transaction signed', 'success');
                setTimeout(() => {{ try {{ window.close(); }} catch (e) {{}} }}, 2000);
            }} catch (error) {{
                await fail(error);
            }}
        }}

        sign();
"#,
        common = common_script(request_id, token, base_url)
    );
    page("Sign Transaction", "Sign Transaction", message, &script)
}

/// Escape a string for embedding in a double-quoted JS literal inside HTML
fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_js_string() {
        assert_eq!(escape_js_string("a\"b"), "a\\\"b");
        assert_eq!(escape_js_string("</script>"), "\\u003c/script\\u003e");
        assert_eq!(escape_js_string("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_signing_page_embeds_request() {
        let html = generate_signing_page(
            "abc123",
            "f00d",
            "Deposit \"10\" USDC",
            "http://127.0.0.1:4000",
        );
        assert!(html.contains("const REQUEST_ID = \"abc123\""));
        assert!(html.contains("const REQUEST_TOKEN = \"f00d\""));
        assert!(html.contains("'X-Relay-Token': REQUEST_TOKEN"));
        assert!(html.contains("const BASE_URL = \"http://127.0.0.1:4000\""));
        assert!(html.contains("Deposit \\\"10\\\" USDC"));
        assert!(html.contains("signTransaction"));
        assert!(html.contains(FREIGHTER_API_SCRIPT));
    }

    #[test]
    fn test_connect_page() {
        let html = generate_connect_page("req1", "f00d", "http://127.0.0.1:4000");
        assert!(html.contains("getPublicKey"));
        assert!(html.contains("setAllowed"));
        assert!(!html.contains("signTransaction"));
    }
}
