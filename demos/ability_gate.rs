//! Ability gating driven by a tags.toml preset.
//!
//! ```bash
//! RUST_LOG=gameplay_tags=debug cargo run --example ability_gate
//! ```

use std::error::Error;

use gameplay_tags::config;
use gameplay_tags::{CompositeRequirement, Requirement, TagContainer};
use gameplay_tags_config::TagsConfig;

const TAGS_TOML: &str = r#"
[tags]
paths = ["State.Combat.Attacking", "State.Dead", "Ability.Fireball", "Status.Silenced"]

[requirements.can_attack]
required = ["State.Combat"]
blocked = ["State.Dead"]

[requirements.can_cast]
mode = "require_any"
required = ["Ability.Fireball"]
blocked = ["Status.Silenced", "State.Dead"]
"#;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let loaded = config::build(&TagsConfig::parse(TAGS_TOML)?)?;
    let registry = &loaded.registry;
    let can_attack = loaded.requirements.get("can_attack").ok_or("can_attack preset missing")?;
    let can_cast = loaded.requirements.get("can_cast").ok_or("can_cast preset missing")?;
    let can_act = CompositeRequirement::any([can_attack.clone(), can_cast.clone()]);

    let mut hero = TagContainer::new();
    hero.on_added(|tag| tracing::info!(%tag, "gained"));
    hero.on_removed(|tag| tracing::info!(%tag, "lost"));

    let report = |label: &str, hero: &TagContainer, gate: &Requirement| {
        match gate.check(hero) {
            Ok(()) => println!("{label:<10} allowed"),
            Err(reason) => println!(
                "{label:<10} denied: {reason} (missing {:?}, blocked by {:?})",
                gate.missing_tags(hero),
                gate.blocking_tags(hero)
            ),
        }
    };

    hero.add(&registry.register("State.Combat.Attacking"));
    hero.add(&registry.register("Ability.Fireball"));
    report("attack", &hero, can_attack);
    report("cast", &hero, can_cast);

    hero.add(&registry.register("Status.Silenced"));
    report("cast", &hero, can_cast);
    println!("can act: {}", can_act.is_satisfied_by(&hero));

    hero.add(&registry.register("State.Dead"));
    report("attack", &hero, can_attack);
    println!("can act: {}", can_act.is_satisfied_by(&hero));

    println!("\nregistered tags:");
    for entry in registry.entries() {
        let marker = if entry.is_explicit { "" } else { " (implicit)" };
        println!("  {}{}", entry.tag, marker);
    }
    Ok(())
}
