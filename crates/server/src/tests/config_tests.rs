use super::{apply_env, apply_file, Settings};

use std::collections::HashMap;

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
site_title = "Acme admin"
max_body_bytes = "1024"
"#,
    );

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.site_title, "Acme admin");
    assert_eq!(settings.max_body_bytes, 1024);
    assert_eq!(settings.frame_url, "/admin/turbo-frame/");
}

#[test]
fn unreadable_file_keeps_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "bind_addr = [");
    assert_eq!(settings.server_bind, Settings::default().server_bind);
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SERVER_BIND", "10.0.0.1:80"),
        ("APP__BIND_ADDR", "10.0.0.2:80"),
        ("APP__ADMIN_HOME", "/cms/"),
        ("APP__MAX_BODY_BYTES", "not a number"),
    ]);

    let mut settings = Settings::default();
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "10.0.0.2:80");
    assert_eq!(settings.admin_home, "/cms/");
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
}
