pub mod envelope;
pub mod utils;

pub use envelope::Envelope;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let e = Envelope::success("ok", serde_json::json!({"k": 1}));
        assert_eq!(e.status, "success");
        assert_eq!(e.error_code, 0);
    }
}
