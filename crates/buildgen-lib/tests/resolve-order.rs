//! End-to-end resolution scenarios driving the public API.

use buildgen::constraint::ConstraintError;
use buildgen::package::*;
use buildgen::resolver::GraphError;
use buildgen::ResolveOptions;

use buildgen_test_utils::*;

fn order_names(resolution: &buildgen::Resolution) -> Vec<String> {
	resolution.build_order().map(|i| i.name().value().to_owned()).collect()
}

fn resolve_plain(universe: &buildgen::PackageUniverse, root: &str) -> buildgen::Resolution {
	buildgen::resolve(universe, &[base(root)], [], &ResolveOptions::default()).expect("universe resolves")
}

#[test]
fn chain_builds_dependencies_first_without_the_root() {
	let universe = plain_universe(&[
		("Top", &["Lib"]),
		("Lib", &["Core"]),
		("Core", &[]),
	]);
	let resolution = resolve_plain(&universe, "Top");
	assert_eq!(order_names(&resolution), vec!["Core".to_owned(), "Lib".to_owned()]);

	/* The root stays retrievable even though the order omits it. */
	let roots: Vec<_> = resolution.root_instances().map(|i| i.name().value().to_owned()).collect();
	assert_eq!(roots, vec!["Top".to_owned()]);
}

#[test]
fn every_dependency_precedes_its_dependents() {
	let universe = plain_universe(&[
		("App", &["Ui", "Net"]),
		("Ui", &["Core"]),
		("Net", &["Core"]),
		("Core", &[]),
	]);
	let resolution = resolve_plain(&universe, "App");
	let order = order_names(&resolution);
	let position = |n: &str| order.iter().position(|o| o == n).unwrap();
	assert!(position("Core") < position("Ui"));
	assert!(position("Core") < position("Net"));
}

#[test]
fn resolution_is_deterministic_across_declaration_orders() {
	let forward = plain_universe(&[
		("App", &["Ui", "Net"]),
		("Ui", &["Core"]),
		("Net", &["Core"]),
		("Core", &[]),
	]);
	let backward = plain_universe(&[
		("Core", &[]),
		("Net", &["Core"]),
		("Ui", &["Core"]),
		("App", &["Net", "Ui"]),
	]);
	assert_eq!(
		order_names(&resolve_plain(&forward, "App")),
		order_names(&resolve_plain(&backward, "App")),
	);
}

#[test]
fn cycle_through_the_root_reports_the_full_trace() {
	let universe = plain_universe(&[
		("A", &["B"]),
		("B", &["C"]),
		("C", &["A"]),
	]);
	let error = buildgen::resolve(&universe, &[base("A")], [], &ResolveOptions::default()).unwrap_err();
	assert!(error.to_string().contains("A->B->C->A"), "unexpected message: {}", error);
}

#[test]
fn cycle_in_a_dependency_names_the_offenders() {
	let universe = plain_universe(&[
		("Top", &["Lib"]),
		("Lib", &["Core"]),
		("Core", &["Lib"]),
	]);
	match buildgen::resolve(&universe, &[base("Top")], [], &ResolveOptions::default()) {
		Err(buildgen::Error::Graph(GraphError::CircularDependencyInDependency { package, participants })) => {
			assert_eq!(package, "Top");
			assert_eq!(participants, vec!["Core".to_owned(), "Lib".to_owned()]);
		},
		other => panic!("expected the dependency-owned cycle error, got {:?}", other),
	}
}

#[test]
fn shared_dependency_with_identical_selections_is_materialized_once() {
	let render_flavor = flavor("Render", "backend", &["GL", "Vulkan"]);

	let mut render = library("Render", &[]);
	render.add_flavor(render_flavor).unwrap();

	let mut ui = library("Ui", &[]);
	ui.add_dependency(DependencyDeclaration::with_flavor_info(
		base("Render"),
		selections(&[("Render", "backend", "GL")]),
	)).unwrap();

	let mut scene = library("Scene", &[]);
	scene.add_dependency(DependencyDeclaration::with_flavor_info(
		base("Render"),
		selections(&[("Render", "backend", "GL")]),
	)).unwrap();

	let universe = sealed_universe(vec![
		executable("App", &["Ui", "Scene"]),
		ui,
		scene,
		render,
	]);

	let resolution = resolve_plain(&universe, "App");

	let render_instances: Vec<_> = resolution.instances().iter()
		.filter(|i| resolution.template(i.template()).name().value() == "Render")
		.collect();
	assert_eq!(render_instances.len(), 1);
	assert_eq!(render_instances[0].name().value(), "Render___GL");

	/* Both parents reference the one shared instance. */
	let shared = render_instances[0].id();
	let ui_instance = resolution.instance_named("Ui").unwrap();
	let scene_instance = resolution.instance_named("Scene").unwrap();
	assert!(ui_instance.dependencies().contains(&shared));
	assert!(scene_instance.dependencies().contains(&shared));
}

#[test]
fn differently_pinned_parents_get_distinct_instances() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let mut ui = library("Ui", &[]);
	ui.add_dependency(DependencyDeclaration::with_flavor_info(
		base("Render"),
		selections(&[("Render", "backend", "GL")]),
	)).unwrap();

	let mut scene = library("Scene", &[]);
	scene.add_dependency(DependencyDeclaration::with_flavor_info(
		base("Render"),
		selections(&[("Render", "backend", "Vulkan")]),
	)).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Ui", "Scene"]), ui, scene, render]);
	let resolution = resolve_plain(&universe, "App");
	let order = order_names(&resolution);

	assert!(order.contains(&"Render___GL".to_owned()));
	assert!(order.contains(&"Render___Vulkan".to_owned()));

	let template = resolution.templates().iter().find(|t| t.name().value() == "Render").unwrap();
	assert_eq!(template.instance_configs().len(), 2);
}

#[test]
fn external_constraint_binds_unpinned_flavors() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render"]), render]);
	let resolution = buildgen::resolve(
		&universe,
		&[base("App")],
		[("Render.backend", "Vulkan")],
		&ResolveOptions::default(),
	).unwrap();

	assert_eq!(order_names(&resolution), vec!["Render___Vulkan".to_owned()]);
}

#[test]
fn unconstrained_flavors_fall_back_to_their_default() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render"]), render]);
	let resolution = resolve_plain(&universe, "App");
	assert_eq!(order_names(&resolution), vec!["Render___GL".to_owned()]);
}

#[test]
fn flavor_wildcard_fans_out_over_every_option() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render"]), render]);
	let mut options = ResolveOptions::default();
	options.set_allow_all_flavors(true);
	let resolution = buildgen::resolve(&universe, &[base("App")], [], &options).unwrap();

	let order = order_names(&resolution);
	assert!(order.contains(&"Render___GL".to_owned()));
	assert!(order.contains(&"Render___Vulkan".to_owned()));
}

#[test]
fn per_option_dependencies_are_active_only_when_bound() {
	let mut render = library("Render", &[]);
	render.add_flavor(PackageFlavor::new(flavor_name("Render", "backend"), vec![
		FlavorOption::new(option("GL")).with_dependency(DependencyDeclaration::new(base("GlLoader"))),
		FlavorOption::new(option("Vulkan")),
	])).unwrap();

	let universe = sealed_universe(vec![
		executable("App", &["Render"]),
		render,
		library("GlLoader", &[]),
	]);

	let gl = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "GL")], &ResolveOptions::default()).unwrap();
	assert!(order_names(&gl).contains(&"GlLoader".to_owned()));

	let vulkan = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "Vulkan")], &ResolveOptions::default()).unwrap();
	assert!(!order_names(&vulkan).contains(&"GlLoader".to_owned()));
}

#[test]
fn unsupported_instances_are_reported_but_not_ordered() {
	let mut render = library("Render", &[]);
	render.add_flavor(PackageFlavor::new(flavor_name("Render", "backend"), vec![
		FlavorOption::new(option("GL")),
		FlavorOption::unsupported(option("Soft")),
	])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render"]), render]);

	let resolution = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "Soft")], &ResolveOptions::default()).unwrap();
	assert!(order_names(&resolution).is_empty());
	/* Still materialized for diagnostics. */
	let soft = resolution.instance_named("Render___Soft").unwrap();
	assert!(!soft.is_supported());

	let mut include = ResolveOptions::default();
	include.set_include_unsupported(true);
	let resolution = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "Soft")], &include).unwrap();
	assert_eq!(order_names(&resolution), vec!["Render___Soft".to_owned()]);
}

#[test]
fn variants_resolve_settings_without_multiplying_instances() {
	let mut core = library("Core", &[]);
	core.add_flavor(PackageFlavor::variant(flavor_name("Core", "runtime"), vec![
		FlavorOption::new(option("static")),
		FlavorOption::new(option("shared")),
	])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Core"]), core]);
	let resolution = buildgen::resolve(
		&universe,
		&[base("App")],
		[("Core.runtime", "shared")],
		&ResolveOptions::default(),
	).unwrap();

	assert_eq!(order_names(&resolution), vec!["Core".to_owned()]);
	let core_instance = resolution.instance_named("Core").unwrap();
	assert_eq!(
		core_instance.variant_settings().get(&flavor_name("Core", "runtime")).unwrap().value(),
		"shared",
	);
}

#[test]
fn singleton_flavor_instances_use_the_smart_name() {
	let mut core = library("Core", &[]);
	core.add_flavor(flavor("Core", "arch", &["x64", "arm64"]).as_singleton()).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Core"]), core]);
	let resolution = resolve_plain(&universe, "App");
	assert_eq!(order_names(&resolution), vec!["Core".to_owned()]);

	/* Fanning the axis out forces the second instance back to the encoded name. */
	let mut options = ResolveOptions::default();
	options.set_allow_all_flavors(true);
	let resolution = buildgen::resolve(&universe, &[base("App")], [], &options).unwrap();
	let order = order_names(&resolution);
	assert!(order.contains(&"Core".to_owned()));
	assert!(order.contains(&"Core___arm64".to_owned()));
}

#[test]
fn flavor_extension_adds_dependencies_and_support_flags() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let mut app = executable("App", &["Render"]);
	app.add_flavor_extension(FlavorExtension::new(flavor_name("Render", "backend"), vec![
		FlavorOption::new(option("GL")).with_dependency(DependencyDeclaration::new(base("GlShim"))),
		FlavorOption::unsupported(option("Vulkan")),
	])).unwrap();

	let universe = sealed_universe(vec![app, render, library("GlShim", &[])]);

	let gl = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "GL")], &ResolveOptions::default()).unwrap();
	assert!(order_names(&gl).contains(&"GlShim".to_owned()));
	assert!(gl.instance_named("App").unwrap().is_supported());

	let vulkan = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "Vulkan")], &ResolveOptions::default()).unwrap();
	assert!(!vulkan.instance_named("App").unwrap().is_supported());
	assert!(!order_names(&vulkan).contains(&"GlShim".to_owned()));
}

#[test]
fn quick_name_collision_is_a_hard_error() {
	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL"]).with_quick_name("gfx")).unwrap();
	let mut compute = library("Compute", &[]);
	compute.add_flavor(flavor("Compute", "backend", &["GL"]).with_quick_name("gfx")).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render", "Compute"]), render, compute]);

	match buildgen::resolve(&universe, &[base("App")], [("gfx", "GL")], &ResolveOptions::default()) {
		Err(buildgen::Error::Constraint(ConstraintError::QuickNameCollision { candidates, .. })) => {
			assert_eq!(candidates, vec!["Compute.backend".to_owned(), "Render.backend".to_owned()]);
		},
		other => panic!("expected a quick name collision, got {:?}", other),
	}

	/* The fully qualified spelling keeps working. */
	assert!(buildgen::resolve(&universe, &[base("App")], [("Render.backend", "GL")], &ResolveOptions::default()).is_ok());
}

#[test]
fn unknown_constraints_warn_and_fall_back_to_defaults() {
	let _ = env_logger::builder().is_test(true).try_init();

	let mut render = library("Render", &[]);
	render.add_flavor(flavor("Render", "backend", &["GL", "Vulkan"])).unwrap();

	let universe = sealed_universe(vec![executable("App", &["Render"]), render]);
	let resolution = buildgen::resolve(
		&universe,
		&[base("App")],
		[("NoSuch.axis", "value")],
		&ResolveOptions::default(),
	).unwrap();
	assert_eq!(order_names(&resolution), vec!["Render___GL".to_owned()]);
}

#[test]
fn multiple_roots_order_among_themselves() {
	let universe = plain_universe(&[
		("ToolA", &["Core"]),
		("ToolB", &["Core"]),
		("Core", &[]),
	]);
	let resolution = buildgen::resolve(
		&universe,
		&[base("ToolA"), base("ToolB")],
		[],
		&ResolveOptions::default(),
	).unwrap();

	let order = order_names(&resolution);
	let position = |n: &str| order.iter().position(|o| o == n).unwrap();
	assert!(position("Core") < position("ToolA"));
	assert!(position("Core") < position("ToolB"));
}

#[test]
fn unknown_root_is_rejected() {
	let universe = plain_universe(&[("Core", &[])]);
	assert!(buildgen::resolve(&universe, &[base("Missing")], [], &ResolveOptions::default()).is_err());
}

#[test]
fn overlay_graph_explains_dependencies() {
	let mut render = library("Render", &[]);
	render.add_flavor(PackageFlavor::new(flavor_name("Render", "backend"), vec![
		FlavorOption::new(option("GL")).with_dependency(DependencyDeclaration::new(base("GlLoader"))),
		FlavorOption::new(option("Vulkan")),
	])).unwrap();

	let universe = sealed_universe(vec![
		executable("App", &["Render"]),
		render,
		library("GlLoader", &[]),
	]);
	let resolution = buildgen::resolve(&universe, &[base("App")], [("Render.backend", "GL")], &ResolveOptions::default()).unwrap();
	let overlay = resolution.package_graph();

	/* Instance edge between the materialized packages. */
	assert!(!overlay.explain("App", "Render___GL").is_empty());
	/* Template edge attributable to the GL branch. */
	let template_edges = overlay.explain("Render", "GlLoader");
	assert!(template_edges.iter().any(|e| e.kind == buildgen::resolver::EdgeKind::TemplateFlavor));
	/* Unrelated packages have nothing to explain. */
	assert!(overlay.explain("GlLoader", "App").is_empty());

	let dot = overlay.dot();
	assert!(dot.contains("Render___GL"));

	let json = overlay.to_json().unwrap();
	assert!(json.contains("Render___GL"));
}
