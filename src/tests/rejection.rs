use crate::{Error, Pattern, Router, handler};

fn noop() -> handler::Handler {
    handler::from_fn(|ctx, next| next.run(ctx))
}

#[test]
fn test_invalid_methods_are_rejected() {
    let mut router = Router::new();

    for method in ["", "   ", "GE T", "GET(", "P/UT"] {
        let err = router.add_route(method, "/users", noop()).unwrap_err();

        assert!(matches!(err, Error::InvalidMethod(_)), "{method:?}: {err:?}");
        assert!(
            err.to_string().contains("expect `method` to be a string"),
            "{err}"
        );
    }

    assert!(router.routes().is_empty());
}

#[test]
fn test_invalid_patterns_are_rejected() {
    let mut router = Router::new();
    let patterns: Vec<Pattern> = vec![
        "users".into(),
        "/a/:/b".into(),
        "/a/*/b".into(),
        "/:id/:id".into(),
        "/:id/*id".into(),
        "/:na-me".into(),
        Vec::<String>::new().into(),
        vec!["/ok", "not-ok"].into(),
    ];

    for pattern in patterns {
        let err = router.add_route("GET", pattern.clone(), noop()).unwrap_err();

        assert!(
            matches!(err, Error::InvalidPattern { .. }),
            "{pattern}: {err:?}"
        );
        assert!(
            err.to_string()
                .contains("expect `pathname` be string, array or function"),
            "{err}"
        );
    }

    assert!(router.routes().is_empty());
}

#[test]
fn test_empty_chain_is_rejected() {
    let mut router = Router::new();

    let err = router
        .add_route("GET", "/users", Vec::<handler::Handler>::new())
        .unwrap_err();

    assert_eq!(err, Error::EmptyChain("GET /users".to_owned()));
    assert!(router.routes().is_empty());
}

#[test]
fn test_compact_form_rejects_bad_parts() {
    let mut router = Router::new();

    assert!(matches!(
        router.add("FETCH( /users", noop()),
        Err(Error::InvalidMethod(_))
    ));
    assert!(matches!(
        router.add("GET users", noop()),
        Err(Error::InvalidPattern { .. })
    ));
    assert!(router.routes().is_empty());
}

#[test]
fn test_standalone_matcher_reports_errors() {
    let router = Router::new();

    assert!(router.route("/users/:id").is_ok());
    assert!(matches!(
        router.route("no-slash"),
        Err(Error::InvalidPattern { reason, .. }) if reason.contains("start with")
    ));
}
