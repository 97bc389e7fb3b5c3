//! Human-readable descriptions for well-known metric names

use std::borrow::Cow;

const KNOWN: &[(&str, &str)] = &[
    ("vus", "Current number of active virtual users"),
    ("vus_max", "Max possible number of virtual users"),
    ("iterations", "The aggregate number of times the VUs executed the script"),
    ("iteration_duration", "The time to complete one full iteration of the script"),
    ("dropped_iterations", "The number of iterations that were not started"),
    ("data_sent", "The amount of data sent"),
    ("data_received", "The amount of received data"),
    ("http_reqs", "How many total HTTP requests were generated"),
    ("http_req_duration", "Total time for the request"),
    ("http_req_blocked", "Time spent blocked before initiating the request"),
    ("http_req_connecting", "Time spent establishing TCP connection to the remote host"),
    ("http_req_tls_handshaking", "Time spent handshaking TLS session with remote host"),
    ("http_req_sending", "Time spent sending data to the remote host"),
    ("http_req_waiting", "Time spent waiting for response from remote host (time to first byte)"),
    ("http_req_receiving", "Time spent receiving response data from the remote host"),
    ("http_req_failed", "The rate of failed requests"),
    ("checks", "The rate of successful checks"),
    ("group_duration", "Time it took to execute a group"),
];

/// Description for `name`; unrecognized names get `Metric: {name}`.
pub fn describe(name: &str) -> Cow<'static, str> {
    KNOWN
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, description)| Cow::Borrowed(*description))
        .unwrap_or_else(|| Cow::Owned(format!("Metric: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_have_descriptions() {
        assert_eq!(describe("vus"), "Current number of active virtual users");
        assert_eq!(describe("http_req_duration"), "Total time for the request");
    }

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(describe("my_custom_trend"), "Metric: my_custom_trend");
        assert_eq!(describe(""), "Metric: ");
    }
}
