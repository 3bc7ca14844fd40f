//! Loopback port checks for spawned engines.

use std::net::TcpListener;

/// Check if a loopback port is free by binding and immediately releasing it.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port))
        .and_then(|listener| listener.local_addr())
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_in_use_is_unavailable() {
        let held = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = held.local_addr().unwrap().port();
        assert!(!is_port_available(port));

        drop(held);
        assert!(is_port_available(port));
    }
}
