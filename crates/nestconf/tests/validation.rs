//! End-to-end validation: text in, validated tree out

use nestconf::error::Issue;
use nestconf::literal::{parse_number, UNITS};
use nestconf::schema::{ArrayField, ChoiceField, ListField, Repeat, Section, TypedArrayField, ValueField};
use nestconf::types::{Host, IpVersion};
use nestconf::{render, Document, Error, Literal, Schema, Type, ValidationError, Value};
use pretty_assertions::assert_eq;

fn validate(text: &str, schema: &Schema) -> Result<nestconf::ValidatedSection, ValidationError> {
    match Document::from_text(text, "test.conf").validate(schema) {
        Ok(validated) => Ok(validated),
        Err(Error::Validation(err)) => Err(err),
        Err(Error::Parse(err)) => panic!("unexpected parse error: {err}"),
    }
}

fn service_schema() -> Schema {
    Schema::new(
        Section::new()
            .key("name", ValueField::new(Type::String))
            .key("debug", ValueField::new(Type::Boolean).with_default(false).arg("--debug"))
            .key(
                "workers",
                ValueField::new(Type::integer_range(Some(1), Some(64))).with_default(4_i64),
            )
            .key("cache_size", ValueField::new(Type::integer()).optional())
            .key("paths", ListField::new(Type::String).optional())
            .key("mode", Type::one_of([("fast", 1_i64), ("safe", 2_i64)]))
            .key("window", ArrayField::new(Type::float(), 2).optional())
            .key(
                "owner",
                TypedArrayField::new(vec![Type::String, Type::integer()]).optional(),
            )
            .key(
                "limit",
                ChoiceField::new()
                    .or(Type::integer())
                    .or(Type::regex("unlimited").unwrap())
                    .optional(),
            )
            .key(
                "server",
                Section::new()
                    .args(Type::String)
                    .unique()
                    .repeat(Repeat::ANY)
                    .key(
                        "listen",
                        ValueField::new(Type::IpSocketAddress {
                            default_host: Some(Host::Ip("0.0.0.0".parse().unwrap())),
                            default_port: Some(80),
                        }),
                    )
                    .key("allow", ListField::new(Type::IpNetwork { version: None }).optional())
                    .key(
                        "location",
                        Section::new()
                            .args(Type::String)
                            .repeat(Repeat::ANY)
                            .key("root", Type::path())
                            .key("pattern", ValueField::new(Type::regex_pattern()).optional()),
                    ),
            )
            .key("extras", Section::new().repeat(Repeat::OPTIONAL).allow_unknown()),
    )
    .unwrap()
}

const SERVICE: &str = r#"
name = 'frontend'
debug = on
cache_size = 64Mi
paths = '/bin', '/usr/bin'
mode = safe
window = 0.5, 2
owner = 'www-data', 33
limit = unlimited

server 'www' {
    listen = ':8080'
    allow = '10.0.0.0/8', '192.168.0.0/16'

    location '/' {
        root = '/srv/www'
    }
    location '/static' {
        root = '/srv/static'
        pattern = '\\.(css|js)$'
    }
}

server 'api' {
    listen = '[::1]'
}

extras {
    anything = 1
    goes 'here' {}
}
"#;

#[test]
fn full_document() {
    let config = validate(SERVICE, &service_schema()).unwrap();

    assert_eq!(config.get("name"), Some(&Value::from("frontend")));
    assert_eq!(config.get("debug"), Some(&Value::Boolean(true)));
    assert_eq!(config.get("workers"), Some(&Value::Integer(4)));
    assert_eq!(config.get("cache_size"), Some(&Value::Integer(64 << 20)));
    assert_eq!(config.get("mode"), Some(&Value::Integer(2)));
    assert_eq!(
        config.get("window"),
        Some(&Value::List(vec![Value::Float(0.5), Value::Float(2.0)]))
    );
    assert_eq!(
        config.get("owner"),
        Some(&Value::List(vec![Value::from("www-data"), Value::Integer(33)]))
    );
    assert_eq!(config.get("limit"), Some(&Value::from("unlimited")));

    let servers = config.subsections("server");
    assert_eq!(servers.len(), 2);

    let www = &servers[0];
    assert_eq!(www.args, vec![Value::from("www")]);
    let Some(Value::Socket(listen)) = www.get("listen") else {
        panic!("listen must be a socket address");
    };
    assert_eq!(listen.to_string(), "0.0.0.0:8080");

    let Some(Value::List(allow)) = www.get("allow") else {
        panic!("allow must be a list");
    };
    let Value::Network(network) = &allow[1] else {
        panic!("allow must contain networks");
    };
    assert!(network.contains(&"192.168.1.1".parse().unwrap()));
    assert_eq!(network.version(), IpVersion::V4);

    let locations = www.subsections("location");
    assert_eq!(locations.len(), 2);
    let Some(Value::Regex(pattern)) = locations[1].get("pattern") else {
        panic!("pattern must be a regex");
    };
    assert!(pattern.is_match("/static/main.css"));

    let api = config.subsection("server").map(|_| ()).unwrap_err();
    assert_eq!(api.to_string(), "section \"server\" is defined 2 times");
    assert_eq!(servers[1].get("listen").map(|listen| matches!(listen, Value::Socket(_))), Some(true));

    let extras = config.subsection("extras").unwrap();
    assert_eq!(extras.get_unknown("anything"), Some(&Literal::Integer(1)));
    assert_eq!(extras.unknown_sections["goes"].len(), 1);
}

#[test]
fn debug_and_paths() {
    let schema = Schema::new(
        Section::new()
            .key("debug", ValueField::new(Type::Boolean))
            .key("paths", ListField::new(Type::String)),
    )
    .unwrap();

    let config = validate("debug = yes\npaths = '/bin', '/usr/bin'", &schema).unwrap();
    assert_eq!(
        serde_json::to_string(&config.to_mapping()).unwrap(),
        r#"{"debug":true,"paths":["/bin","/usr/bin"]}"#
    );
}

#[test]
fn units_multiply_their_base() {
    for base in ["0", "1", "3", "-7"] {
        let Literal::Integer(plain) = parse_number(base).unwrap() else {
            panic!("{base} must be an integer");
        };
        for (unit, multiplier) in UNITS {
            assert_eq!(
                parse_number(&format!("{base}{unit}")),
                Ok(Literal::Integer(plain * *multiplier as i64)),
                "{base}{unit}"
            );
        }
    }
    assert_eq!(parse_number("42k"), Ok(Literal::Integer(42 * 1000)));
}

#[test]
fn render_round_trip() {
    let schema = service_schema();
    let first = validate(SERVICE, &schema).unwrap();

    let rendered = render::to_string(&first);
    let second = validate(&rendered, &schema)
        .unwrap_or_else(|err| panic!("rendered text must validate: {err}\n{rendered}"));

    assert_eq!(first.to_mapping(), second.to_mapping());
}

#[test]
fn render_keeps_words_and_leaves_defaults_out() {
    let schema = Schema::new(
        Section::new()
            .key(
                "mode",
                ValueField::new(Type::one_of([("fast", 1_i64), ("safe", 2_i64)])).with_default(2_i64),
            )
            .key(
                "pool",
                Section::new()
                    .args(Type::one_of([("fast", 1_i64), ("safe", 2_i64)]))
                    .repeat(Repeat::ANY)
                    .key("size", Type::integer()),
            )
            .key(
                "mount",
                Section::new()
                    .args(Type::named_regex("(?P<device>[a-z]+):(?P<dir>/.*)").unwrap())
                    .repeat(Repeat::ANY),
            ),
    )
    .unwrap();

    let first = validate("pool fast { size = 2 }\nmount 'sda:/srv' {}", &schema).unwrap();
    assert_eq!(first.get("mode"), Some(&Value::Integer(2)));

    let rendered = render::to_string(&first);
    assert_eq!(
        rendered,
        "pool 'fast' {\n    size = 2\n}\nmount 'sda:/srv' {\n}\n"
    );

    let second = validate(&rendered, &schema)
        .unwrap_or_else(|err| panic!("rendered text must validate: {err}\n{rendered}"));
    assert_eq!(first.to_mapping(), second.to_mapping());
}

#[test]
fn boolean_words_are_choices_too() {
    let schema = Schema::new(
        Section::new()
            .key("tls", Type::one_of([("on", 1_i64), ("off", 0_i64), ("auto", -1_i64)]))
            .key("name", ValueField::new(Type::String).optional()),
    )
    .unwrap();

    let config = validate("tls = on\nname = off", &schema).unwrap();
    assert_eq!(config.get("tls"), Some(&Value::Integer(1)));
    assert_eq!(config.get("name"), Some(&Value::from("off")));
    assert_eq!(render::to_string(&config), "tls = on\nname = off\n");

    let strict = Schema::new(Section::new().key("x", Type::one_of([("yes", 1_i64)]))).unwrap();
    let err = validate("x = on", &strict).unwrap_err();
    assert_eq!(
        err.to_string(),
        "test.conf:1:1: x: bad choice on (must be one of \"yes\")"
    );
}

#[test]
fn validation_is_idempotent() {
    let schema = service_schema();
    assert_eq!(
        validate(SERVICE, &schema).unwrap(),
        validate(SERVICE, &schema).unwrap()
    );
}

#[test]
fn repeat_once() {
    let schema = Schema::new(Section::new().key("db", Section::new().repeat(Repeat::ONCE))).unwrap();

    assert!(validate("db {}", &schema).is_ok());

    let err = validate("", &schema).unwrap_err();
    assert!(matches!(err.issue, Issue::RepeatCount { found: 0, min: 1, max: Some(1), .. }));

    let err = validate("db {}\ndb {}", &schema).unwrap_err();
    assert!(matches!(err.issue, Issue::RepeatCount { found: 2, .. }));
    assert_eq!(
        err.to_string(),
        "test.conf:2:1: db: section \"db\" must be defined exactly 1 time(s), found 2"
    );
}

#[test]
fn unique_hosts() {
    let schema = Schema::new(Section::new().key(
        "host",
        Section::new()
            .args(Type::String)
            .unique()
            .repeat(Repeat::new(0, None)),
    ))
    .unwrap();

    assert!(validate("host 'a' {}\nhost 'b' {}", &schema).is_ok());

    let err = validate("host 'a' {}\nhost 'a' {}", &schema).unwrap_err();
    assert!(err.to_string().contains("\"host\""));
    assert!(err.to_string().contains("'a'"));
    assert_eq!(err.position.unwrap().line, 2);
}

#[test]
fn unknown_key_policy() {
    let strict = Schema::new(Section::new().key("known", Type::integer())).unwrap();
    let err = validate("known = 1\nother = 2", &strict).unwrap_err();
    assert_eq!(err.issue, Issue::UnknownKey("other".to_string()));

    let relaxed =
        Schema::new(Section::new().key("known", Type::integer()).allow_unknown()).unwrap();
    let config = validate("known = 1\nother = 2k", &relaxed).unwrap();
    assert_eq!(config.get_unknown("other"), Some(&Literal::Integer(2000)));
}

#[test]
fn rate_must_be_an_integer() {
    let schema = Schema::new(Section::new().key("rate", ValueField::new(Type::integer()))).unwrap();

    let err = validate("rate = abc", &schema).unwrap_err();
    assert_eq!(err.path, "rate");
    let message = err.to_string();
    assert!(message.contains("rate"), "{message}");
    assert!(message.contains("abc"), "{message}");
}

#[test]
fn type_errors_point_at_the_assignment() {
    let err = validate("name = x\nmode = slow", &service_schema()).unwrap_err();
    assert_eq!(err.path, "mode");
    assert_eq!(
        err.to_string(),
        "test.conf:2:1: mode: bad choice 'slow' (must be one of \"fast\", \"safe\")"
    );

    let err = validate("name = x\nmode = fast\nworkers = 100", &service_schema()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "test.conf:3:1: workers: 100 is greater than the maximum (64)"
    );

    let err = validate("name = x\nmode = fast\nowner = 33, 'www'", &service_schema()).unwrap_err();
    assert!(matches!(err.issue, Issue::Item { index: 1, .. }));

    let err = validate("name = x\nmode = fast\nlimit = maybe", &service_schema()).unwrap_err();
    assert!(matches!(err.issue, Issue::NoAlternative(ref failures) if failures.len() == 2));
}

#[test]
fn parse_errors_are_not_validation_errors() {
    let err = Document::from_text("name = 'open", "test.conf")
        .validate(&service_schema())
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(err.to_string(), "test.conf:1:8: unterminated string literal");
}
