#[cfg(test)]
mod tests {
    use crate::batch::split_statements;
    use crate::types::{CellValue, StepInput, StepOutput, NULL_TOKEN};

    #[test]
    fn split_drops_empty_fragments() {
        assert_eq!(split_statements("A; B ;;  "), vec!["A", "B"]);
    }

    #[test]
    fn split_preserves_order() {
        let stmts = split_statements("INSERT INTO t VALUES (1); SELECT * FROM t; DELETE FROM t");
        assert_eq!(
            stmts,
            vec![
                "INSERT INTO t VALUES (1)",
                "SELECT * FROM t",
                "DELETE FROM t"
            ]
        );
    }

    #[test]
    fn split_of_empty_input_is_empty() {
        assert!(split_statements("").is_empty());
        assert!(split_statements(" ;; ; ").is_empty());
    }

    #[test]
    fn cell_rendering_is_total() {
        assert_eq!(CellValue::Null.render(), NULL_TOKEN);
        assert_eq!(CellValue::Bytes(b"abc".to_vec()).render(), "abc");
        assert_eq!(CellValue::Int(42).render(), "42");
        assert_eq!(CellValue::UInt(7).render(), "7");
        assert_eq!(CellValue::Float(1.5).render(), "1.5");
        assert_eq!(CellValue::Bool(true).render(), "true");
        assert_eq!(CellValue::Text("hi".into()).render(), "hi");
    }

    #[test]
    fn bytes_render_lossy_on_invalid_utf8() {
        let rendered = CellValue::Bytes(vec![0x61, 0xff, 0x62]).render();
        assert!(rendered.starts_with('a'));
        assert!(rendered.ends_with('b'));
    }

    #[test]
    fn fixed_output_shape() {
        let output = StepOutput::fixed();
        let encoded = serde_json::to_value(&output).expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({ "version": { "version": "static" }, "metadata": [] })
        );
    }

    #[test]
    fn input_decodes_with_query() {
        let input: StepInput = serde_json::from_str(
            r#"{
                "source": {
                    "user": "app",
                    "pass": "secret",
                    "host": "proj:region:db",
                    "database": "orders",
                    "private_key": "{\"type\":\"service_account\"}"
                },
                "params": { "query": "SELECT 1;" }
            }"#,
        )
        .expect("decode");
        assert_eq!(input.source.host, "proj:region:db");
        assert_eq!(input.params.query, "SELECT 1;");
        input.validate().expect("valid");
    }

    #[test]
    fn input_decodes_without_params() {
        let input: StepInput = serde_json::from_str(
            r#"{
                "source": {
                    "user": "app",
                    "pass": "secret",
                    "host": "proj:region:db",
                    "database": "orders",
                    "private_key": "key"
                }
            }"#,
        )
        .expect("decode");
        assert!(input.params.query.is_empty());
    }

    #[test]
    fn input_rejects_empty_host() {
        let input: StepInput = serde_json::from_str(
            r#"{
                "source": {
                    "user": "app",
                    "pass": "secret",
                    "host": " ",
                    "database": "orders",
                    "private_key": "key"
                }
            }"#,
        )
        .expect("decode");
        assert!(input.validate().is_err());
    }
}
