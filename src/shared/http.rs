use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("http {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("invalid json from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Authenticated GET returning the parsed JSON body.
pub fn get_json(url: &str, bearer: &str) -> Result<Value, HttpError> {
    get_json_with_headers(url, bearer, &[])
}

pub fn get_json_with_headers(
    url: &str,
    bearer: &str,
    headers: &[(&str, &str)],
) -> Result<Value, HttpError> {
    let mut request = ureq::get(url)
        .set("Authorization", &format!("Bearer {bearer}"))
        .set("Accept", "application/json");
    for (name, value) in headers {
        request = request.set(name, value);
    }

    let response = match request.call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(HttpError::Status {
                status,
                message: error_message(&body),
            });
        }
        Err(err) => {
            return Err(HttpError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            })
        }
    };

    response
        .into_json::<Value>()
        .map_err(|err| HttpError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        })
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}


/// One-shot HTTP server for exercising the real clients in tests.
#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves a single response and hands back the request line plus
    /// lower-cased header names.
    pub(crate) fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let status_line = status_line.to_string();
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            let mut request = String::new();
            reader.read_line(&mut request).expect("read request line");
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header line");
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                match line.split_once(':') {
                    Some((name, value)) => {
                        request.push_str(&format!("{}:{}", name.to_ascii_lowercase(), value))
                    }
                    None => request.push_str(&line),
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response");
            request
        });

        (format!("http://{addr}"), handle)
    }
}
