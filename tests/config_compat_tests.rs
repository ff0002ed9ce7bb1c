use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tailwind_compat::{
    compile, CompileOptions, CompilerError, ConfigLoader, ConfigTree, Directive, InlineConfigLoader, Plugin,
};

fn utilities_with_config() -> Vec<Directive> {
    vec![Directive::tailwind("utilities"), Directive::config("./config.js")]
}

fn tree(value: serde_json::Value) -> ConfigTree {
    ConfigTree::from_value(&value).unwrap()
}

async fn compile_with(directives: &[Directive], config: ConfigTree) -> tailwind_compat::Compiler {
    compile(directives, CompileOptions::with_loader(InlineConfigLoader::new(config)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_config_files_can_add_content() {
    let compiler = compile_with(&utilities_with_config(), tree(json!({ "content": ["./file.txt"] }))).await;
    assert_eq!(compiler.globs(), ["./file.txt".to_string()]);
}

#[tokio::test]
async fn test_config_files_can_change_dark_mode_media() {
    let compiler = compile_with(&utilities_with_config(), tree(json!({ "darkMode": "media" }))).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  @media (prefers-color-scheme: dark) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_config_files_can_change_dark_mode_selector() {
    let compiler = compile_with(&utilities_with_config(), tree(json!({ "darkMode": "selector" }))).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:where(.dark, .dark *) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_config_files_can_change_dark_mode_variant() {
    let compiler = compile_with(
        &utilities_with_config(),
        tree(json!({ "darkMode": ["variant", "&:where(:not(.light))"] })),
    )
    .await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:where(:not(.light)) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_config_files_can_add_plugins() {
    let config = ConfigTree::new().with_plugin(Plugin::new("no-scrollbar", |api| {
        api.add_utilities(json!({ ".no-scrollbar": { "scrollbar-width": "none" } }))?;
        Ok(())
    }));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(compiler.build(["no-scrollbar"]), ".no-scrollbar {\n  scrollbar-width: none;\n}\n");
}

#[tokio::test]
async fn test_plugins_can_contribute_to_the_config() {
    let config = ConfigTree::new().with_plugin(Plugin::with_config(
        "light-dark",
        |_| Ok(()),
        tree(json!({ "darkMode": ["variant", "&:where(:not(.light))"] })),
    ));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:where(:not(.light)) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_plugin_config_content_is_ignored() {
    let config = ConfigTree::new().with_plugin(Plugin::with_config(
        "with-content",
        |_| Ok(()),
        tree(json!({ "content": ["./plugin.html"], "presets": [{ "content": ["./preset.html"] }] })),
    ));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert!(compiler.globs().is_empty());
}

#[tokio::test]
async fn test_root_theme_beats_preset_extend() {
    let config = tree(json!({
        "presets": [{ "theme": { "extend": { "colors": { "primary": "#aaa" } } } }],
        "theme": { "colors": { "primary": "#root" } }
    }));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(compiler.build(["bg-primary"]), ".bg-primary {\n  background-color: #root;\n}\n");
}

#[tokio::test]
async fn test_presets_can_contribute_to_the_config() {
    let config = tree(json!({
        "presets": [{ "darkMode": ["variant", "&:where(:not(.light))"] }]
    }));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:where(:not(.light)) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_config_files_can_affect_the_theme() {
    let config = tree(json!({
        "theme": { "extend": { "colors": { "primary": "#c0ffee" } } }
    }))
    .with_plugin(Plugin::new("scrollbar", |api| {
        let primary = api.theme("colors.primary").context("colors.primary is missing")?;
        api.add_utilities(json!({ ".scrollbar-primary": { "scrollbarColor": primary } }))?;
        Ok(())
    }));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(
        compiler.build(["bg-primary", "scrollbar-primary"]),
        ".bg-primary {\n  background-color: #c0ffee;\n}\n.scrollbar-primary {\n  scrollbar-color: #c0ffee;\n}\n"
    );
}

#[tokio::test]
async fn test_native_variants_overwrite_config_and_plugin_variants() {
    let mut directives = utilities_with_config();
    directives.push(Directive::variant("dark", "&:is(.my-dark)"));
    directives.push(Directive::variant("light", "&:is(.my-light)"));

    let config = tree(json!({ "darkMode": ["variant", "&:is(.dark)"] })).with_plugin(Plugin::new(
        "light",
        |api| {
            api.add_variant("light", "&:is(.light)")?;
            Ok(())
        },
    ));
    let compiler = compile_with(&directives, config).await;
    assert_eq!(
        compiler.build(["dark:underline", "light:underline"]),
        ".dark\\:underline {\n  &:is(.my-dark) {\n    text-decoration-line: underline;\n  }\n}\n\
         .light\\:underline {\n  &:is(.my-light) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_native_variant_wins_regardless_of_directive_order() {
    let directives = vec![
        Directive::variant("dark", "&:is(.my-dark)"),
        Directive::tailwind("utilities"),
        Directive::config("./config.js"),
    ];
    let compiler = compile_with(&directives, tree(json!({ "darkMode": "media" }))).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:is(.my-dark) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_plugin_variant_overrides_config_dark_mode() {
    let config = tree(json!({ "darkMode": "media" })).with_plugin(Plugin::new("dark-class", |api| {
        api.add_variant("dark", "&:is(.night)")?;
        Ok(())
    }));
    let compiler = compile_with(&utilities_with_config(), config).await;
    assert_eq!(
        compiler.build(["dark:underline"]),
        ".dark\\:underline {\n  &:is(.night) {\n    text-decoration-line: underline;\n  }\n}\n"
    );
}

#[tokio::test]
async fn test_build_is_idempotent_and_drops_unmatched() {
    let compiler = compile_with(&utilities_with_config(), tree(json!({ "darkMode": "selector" }))).await;
    let candidates = ["dark:underline", "not-a-utility", "nope:flex", "flex"];
    let first = compiler.build(candidates);
    assert_eq!(first, compiler.build(candidates));
    assert_eq!(
        first,
        ".dark\\:underline {\n  &:where(.dark, .dark *) {\n    text-decoration-line: underline;\n  }\n}\n\
         .flex {\n  display: flex;\n}\n"
    );
    assert_eq!(compiler.build(["not-a-utility"]), "");
}

#[tokio::test]
async fn test_compiler_shared_across_threads() {
    let compiler = compile_with(&utilities_with_config(), tree(json!({ "darkMode": "media" }))).await;
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let compiler = compiler.clone();
            std::thread::spawn(move || compiler.build(["dark:underline"]))
        })
        .collect();
    let expected = compiler.build(["dark:underline"]);
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[tokio::test]
async fn test_plugin_failure_aborts_compile() {
    let config = ConfigTree::new().with_plugin(Plugin::new("broken", |_| anyhow::bail!("no theme for you")));
    let err = compile(
        &utilities_with_config(),
        CompileOptions::with_loader(InlineConfigLoader::new(config)),
    )
    .await
    .unwrap_err();
    match err {
        CompilerError::Plugin { plugin, message } => {
            assert_eq!(plugin, "broken");
            assert!(message.contains("no theme for you"));
        }
        other => panic!("expected a plugin error, got {:?}", other),
    }
}

struct FailingLoader;

#[async_trait]
impl ConfigLoader for FailingLoader {
    async fn load_config(&self, path: &str) -> tailwind_compat::Result<ConfigTree> {
        Err(CompilerError::Load {
            path: path.to_string(),
            message: "not found".to_string(),
        })
    }
}

#[tokio::test]
async fn test_loader_errors_propagate() {
    let err = compile(&utilities_with_config(), CompileOptions::with_loader(FailingLoader))
        .await
        .unwrap_err();
    assert!(matches!(err, CompilerError::Load { ref path, .. } if path.as_str() == "./config.js"));
}

#[tokio::test]
async fn test_malformed_config_is_rejected() {
    let err = ConfigTree::from_value(&json!({ "darkMode": ["variant"] })).unwrap_err();
    assert!(matches!(err, CompilerError::Config { .. }));
}
