//! Comprehensive tests for context module.

#[cfg(test)]
mod tests {
    use crate::cancellation::Scope;
    use crate::context::{keys, Context, ContextValue, RunIdentity};
    use crate::errors::CommandError;
    use crate::storage::StorageObject;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_missing_key() {
        let ctx = Context::new();
        let err = ctx.get("audio_uri").unwrap_err();
        assert!(matches!(err, CommandError::MissingKey { ref key } if key == "audio_uri"));
    }

    #[test]
    fn test_set_then_get() {
        let mut ctx = Context::new();
        ctx.set("audio_uri", "gs://audio/a.wav");

        assert_eq!(
            ctx.get("audio_uri").unwrap(),
            &ContextValue::Text("gs://audio/a.wav".to_string())
        );
        assert_eq!(ctx.get_as::<String>("audio_uri").unwrap(), "gs://audio/a.wav");
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = Context::new();
        ctx.set("k", "first");
        ctx.set("k", "second");

        assert_eq!(ctx.get_as::<String>("k").unwrap(), "second");
        assert_eq!(ctx.keys(), vec!["k"]);
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let mut ctx = Context::new();
        ctx.set("k", StorageObject::new("raw", "a.mp4"));

        let err = ctx.get_as::<String>("k").unwrap_err();
        match err {
            CommandError::TypeMismatch { key, expected, found } => {
                assert_eq!(key, "k");
                assert_eq!(expected, "text");
                assert_eq!(found, "storage object");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_typed_keys() {
        let mut ctx = Context::new();
        let obj = StorageObject::new("raw", "video.mp4");
        ctx.set_typed(&keys::INPUT_OBJECT, obj.clone());
        ctx.set_typed(&keys::CTX_OUT, "gs://audio/video.srt".to_string());

        assert_eq!(ctx.get_typed(&keys::INPUT_OBJECT).unwrap(), obj);
        assert_eq!(ctx.output(), Some("gs://audio/video.srt"));
    }

    #[test]
    fn test_output_absent_until_written() {
        let ctx = Context::new();
        assert!(ctx.output().is_none());
        assert!(ctx.get_typed(&keys::CTX_OUT).is_err());
    }

    #[test]
    fn test_add_error_appends() {
        let mut ctx = Context::new();
        ctx.add_error("extract", CommandError::external_tool("ffmpeg", "exit status 1"));
        ctx.add_error("extract", CommandError::cancelled("deadline exceeded"));
        ctx.add_error("transcribe", CommandError::missing_key("audio_uri"));

        assert!(ctx.has_errors());
        assert_eq!(ctx.errors().len(), 3);
        assert_eq!(ctx.errors_for("extract").len(), 2);
        assert_eq!(ctx.errors_for("transcribe").len(), 1);
    }

    #[test]
    fn test_add_error_leaves_params_untouched() {
        let mut ctx = Context::new().with_value("k", "v");
        ctx.add_error("c", CommandError::missing_key("x"));

        assert_eq!(ctx.get_as::<String>("k").unwrap(), "v");
    }

    #[test]
    fn test_fresh_contexts_are_isolated() {
        let mut first = Context::new();
        first.set("audio_uri", "gs://audio/a.wav");
        first.add_error("extract", CommandError::missing_key("x"));

        let second = Context::new();
        assert!(!second.contains_key("audio_uri"));
        assert!(!second.has_errors());
        assert_ne!(
            first.run_identity().pipeline_run_id,
            second.run_identity().pipeline_run_id
        );
    }

    #[test]
    fn test_scope_is_carried() {
        let scope = Scope::new();
        let ctx = Context::new().with_scope(scope.clone());
        assert!(!ctx.scope().is_cancelled());

        scope.cancel("operator abort");
        assert!(ctx.scope().is_cancelled());
    }

    #[test]
    fn test_with_identity() {
        let identity = RunIdentity::new();
        let ctx = Context::new().with_identity(identity.clone());
        assert_eq!(ctx.run_identity(), &identity);
    }
}
