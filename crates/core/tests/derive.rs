//! `#[derive(Reflect)]` end to end

use std::sync::Arc;

use teaspoon_core::inspect::Inspector;
use teaspoon_core::types::name_hash;
use teaspoon_core::{
    GenericContainer, GenericReference, Object, ObjectBase, ObjectRef, Reflect, ReflectError,
    TypeRegistry,
};

#[derive(Reflect, Default)]
#[reflect(name = "Item", description = "item")]
struct Item {
    #[reflect(base)]
    base: ObjectBase,

    #[reflect(default = "torch")]
    label: String,

    #[reflect(default = 1)]
    weight: u32,
}

#[derive(Reflect, Default)]
#[reflect(name = "Actor", description = "actor")]
struct Actor {
    #[reflect(base)]
    base: ObjectBase,

    #[reflect(default = 100, readonly)]
    health: i32,

    #[reflect(rename = "label", default = "nobody")]
    name: String,

    inventory: Vec<Option<Box<Item>>>,

    #[reflect(skip)]
    scratch: Vec<u8>,
}

#[derive(Reflect, Default)]
#[reflect(name = "Hero", description = "hero")]
struct Hero {
    #[reflect(base)]
    actor: Actor,

    #[reflect(default = 3)]
    level: u8,

    #[reflect(default = "hero")]
    name: String,
}

#[derive(Reflect, Default)]
#[reflect(abstract_type)]
struct Marker {
    #[reflect(base)]
    base: ObjectBase,
}

#[derive(Reflect, Default)]
#[reflect(description = "2d point")]
struct Point {
    x: f32,
    y: f32,
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_builtins();
    registry.ensure::<Hero>().unwrap();
    registry
}

#[test]
fn test_constants() {
    assert_eq!(Actor::NAME, "Actor");
    assert_eq!(Actor::DESCRIPTION, "actor");
    assert_eq!(Actor::NAME_HASH, name_hash("Actor"));
    assert_eq!(Marker::NAME, "Marker");
    assert_eq!(Marker::DESCRIPTION, "Marker");
    assert_eq!(Point::DESCRIPTION, "2d point");
}

#[test]
fn test_hierarchy_follows_base_fields() {
    let registry = registry();
    let hero = registry.key_of::<Hero>().unwrap();
    let actor = registry.key_of::<Actor>().unwrap();

    assert_eq!(registry.base(hero), Some(actor));
    assert_eq!(registry.base(actor), Some(registry.object_type()));
    assert!(registry.is(hero, registry.object_type()));
    assert!(!registry.is(actor, hero));

    let listing = registry.hierarchy();
    assert!(listing.contains("        Object ( type )\n"));
    assert!(listing.contains("            Actor ( health label inventory )\n"));
    assert!(listing.contains("                Hero ( level name )\n"));
    assert!(listing.contains("            Item ( label weight )\n"));
}

#[test]
fn test_create_applies_defaults() {
    let registry = registry();
    let hero = registry.create::<Hero>().unwrap();

    assert_eq!(hero.level, 3);
    assert_eq!(hero.name, "hero");
    assert_eq!(hero.actor.health, 100);
    assert_eq!(hero.actor.name, "nobody");
    assert!(hero.actor.inventory.is_empty());
    assert!(hero.actor.scratch.is_empty());

    let key = registry.key_of::<Hero>().unwrap();
    assert_eq!(hero.object_type(), key);
    assert!(hero.is(&registry, registry.key_of::<Actor>().unwrap()));
}

#[test]
fn test_field_lookup() {
    let registry = registry();
    let hero = registry.key_of::<Hero>().unwrap();

    let name = registry.get_field_by_name(hero, "name").unwrap();
    assert_eq!(registry.get(name).unwrap().name(), "Hero.name");
    let label = registry.get_field_by_name(hero, "label").unwrap();
    assert_eq!(registry.get(label).unwrap().name(), "Actor.label");
    assert!(registry.get_field_by_name(hero, "scratch").is_none());
    assert!(registry.get_field_by_name(hero, "base").is_none());
}

#[test]
fn test_field_access_through_base() {
    let registry = registry();
    let hero = registry.key_of::<Hero>().unwrap();
    let mut instance = registry.create_instance(hero).unwrap();

    let health = registry
        .field(registry.get_field_by_name(hero, "health").unwrap())
        .unwrap();
    assert!(health.is_readonly());
    assert!(health.get_mut(instance.as_mut()).is_none());
    let value = health.get(instance.as_ref()).unwrap();
    assert_eq!(value.as_any().downcast_ref::<i32>(), Some(&100));

    let label = registry
        .field(registry.get_field_by_name(hero, "label").unwrap())
        .unwrap();
    *label
        .get_mut(instance.as_mut())
        .unwrap()
        .as_any_mut()
        .downcast_mut::<String>()
        .unwrap() = "renamed".to_string();

    let actor = registry.cast::<Actor>(instance.as_ref()).unwrap();
    assert_eq!(actor.name, "renamed");

    assert!(label.set_default_value(instance.as_mut()));
    let actor = registry.cast::<Actor>(instance.as_ref()).unwrap();
    assert_eq!(actor.name, "nobody");
}

#[test]
fn test_abstract_type() {
    let mut registry = registry();
    let marker = registry.ensure::<Marker>().unwrap();

    assert!(registry.get(marker).unwrap().is_abstract());
    assert!(matches!(
        registry.create_instance(marker),
        Err(ReflectError::AbstractType(name)) if name == "Marker"
    ));
}

#[test]
fn test_plain_struct() {
    let mut registry = registry();
    let point = registry.ensure::<Point>().unwrap();
    assert_eq!(registry.base(point), Some(registry.root()));

    let value = Point { x: 1.5, y: -2.0 };
    assert!(value.live_type().is_none());
    assert!(value.as_object().is_none());

    let y = registry
        .field(registry.get_field_by_name(point, "y").unwrap())
        .unwrap();
    let read = y.get(&value).unwrap();
    assert_eq!(read.as_any().downcast_ref::<f32>(), Some(&-2.0));

    let created = registry.create::<Point>().unwrap();
    assert_eq!(created.x, 0.0);
}

#[test]
#[should_panic(expected = "no type descriptor")]
fn test_cast_of_default_built_object_is_fatal() {
    let registry = registry();
    let item = Item::default();
    let _ = registry.cast::<Item>(&item);
}

#[test]
#[should_panic(expected = "no type descriptor")]
fn test_field_of_default_built_object_is_fatal() {
    let registry = registry();
    let item = registry.key_of::<Item>().unwrap();
    let weight = registry
        .field(registry.get_field_by_name(item, "weight").unwrap())
        .unwrap();
    let _ = weight.get(&Item::default());
}

#[test]
fn test_destroy_through_object() {
    let registry = registry();
    let hero: Box<dyn Object> = registry.create::<Hero>().unwrap();
    assert!(hero.is(&registry, registry.key_of::<Actor>().unwrap()));
    hero.destroy(&registry);
}

#[test]
fn test_inspect_object_graph() {
    let registry = registry();
    let mut hero = registry.create::<Hero>().unwrap();
    hero.actor
        .inventory
        .push(Some(registry.create::<Item>().unwrap()));
    hero.actor.inventory.push(None);

    let text = Inspector::new(&registry).object(&*hero);
    let expected = concat!(
        "hero\n",
        "    level = 3\n",
        "    name = \"hero\"\n",
        "    health = 100\n",
        "    label = \"nobody\"\n",
        "    inventory\n",
        "        item\n",
        "            label = \"torch\"\n",
        "            weight = 1\n",
        "            type = Item\n",
        "        item = (null)\n",
        "    type = Hero\n",
    );
    assert_eq!(text, expected);
}

#[test]
fn test_inspect_depth_limit() {
    let registry = registry();
    let hero = registry.create::<Hero>().unwrap();

    let text = Inspector::new(&registry)
        .with_max_depth(1)
        .object(&*hero);
    assert_eq!(text, "hero\n");
}

#[test]
fn test_objects_in_scopes() {
    let registry = registry();
    let alice: ObjectRef = Arc::new(*registry.create::<Actor>().unwrap());
    let bob: ObjectRef = Arc::new(*registry.create::<Hero>().unwrap());

    let root = Arc::new(GenericContainer::new());
    root.add("alice", alice.clone());
    let scope = Arc::new(GenericContainer::new().with_parent(root));
    scope.add("bob", bob);

    let reference = GenericReference::with_context(scope.clone(), "alice");
    let resolved = reference.resolve().unwrap();
    assert!(Arc::ptr_eq(&resolved, &alice));

    let actor = registry.cast::<Actor>(resolved.as_reflect()).unwrap();
    assert_eq!(actor.health, 100);

    let bob = scope.child("bob").unwrap();
    assert_eq!(bob.object_type(), registry.key_of::<Hero>().unwrap());
    assert!(registry.cast::<Actor>(bob.as_reflect()).is_some());
    assert!(registry.cast::<Item>(bob.as_reflect()).is_none());
}
