//! Memoized combinatorial expansion of templates into instances.
//!
//! Expansion starts from each requested root and recursively materializes,
//! for each active dependency edge, the target instances implied by the
//! edge's pinned selections, the external constraints and the target's own
//! defaults. Materialized instances are memoized by
//! `(template, selections)` so two parents requiring the identical recipe for
//! a shared dependency collapse to one shared instance; that memoization is
//! also what keeps the walk terminating on cyclic declarations, which the
//! graph pass diagnoses afterwards.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::constraint::ExternalFlavorConstraints;
use crate::package::FlavorName;
use crate::package::FlavorOptionName;
use crate::package::FlavorSelection;
use crate::package::FlavorSelections;
use crate::package::PackageBaseName;
use crate::package::PackageInstanceName;
use crate::universe::PackageUniverse;
use super::ResolveOptions;
use super::instance::InstanceId;
use super::instance::ResolvedPackageInstance;
use super::template::ResolvedPackageTemplate;
use super::template::TemplateId;

/// These errors halt expansion.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
	#[error("requested root package `{package}` does not exist")]
	UnknownRoot { package: String },
}

pub(super) struct Expander<'u> {
	constraints: &'u ExternalFlavorConstraints,
	options: &'u ResolveOptions,
	templates: Vec<ResolvedPackageTemplate>,
	template_ids: HashMap<PackageBaseName, TemplateId>,
	instances: Vec<ResolvedPackageInstance>,
	memo: HashMap<(TemplateId, FlavorSelections), InstanceId>,
	names: HashMap<PackageInstanceName, InstanceId>,
}

impl<'u> Expander<'u> {
	/// Lowers every package of the sealed universe into template form. The
	/// universe iterates name-ordered, so template ids are deterministic.
	pub fn new(universe: &'u PackageUniverse, constraints: &'u ExternalFlavorConstraints, options: &'u ResolveOptions) -> Self {
		let mut template_ids = HashMap::new();
		for (index, package) in universe.packages().enumerate() {
			template_ids.insert(package.name().clone(), TemplateId::new(index));
		}

		let templates = universe.packages()
			.enumerate()
			.map(|(index, package)| ResolvedPackageTemplate::lower(TemplateId::new(index), package, &template_ids))
			.collect();

		Expander {
			constraints,
			options,
			templates,
			template_ids,
			instances: Vec::new(),
			memo: HashMap::new(),
			names: HashMap::new(),
		}
	}

	pub fn into_parts(self) -> (Vec<ResolvedPackageTemplate>, Vec<ResolvedPackageInstance>) {
		(self.templates, self.instances)
	}

	/// Materializes the instances of every requested root.
	///
	/// # Errors
	/// [`UnknownRoot`](ExpandError::UnknownRoot) when a requested name is not
	/// in the universe.
	pub fn expand_roots(&mut self, roots: &[PackageBaseName]) -> crate::Result<Vec<InstanceId>> {
		let mut out = Vec::new();
		for root in roots {
			let template = match self.template_ids.get(root) {
				Some(t) => *t,
				None => return Err(ExpandError::UnknownRoot { package: root.value().to_owned() }.into()),
			};
			for selections in self.selection_sets(template, &FlavorSelections::empty()) {
				let instance = self.expand(template, selections);
				if !out.contains(&instance) {
					out.push(instance);
				}
			}
		}
		Ok(out)
	}

	/// The selection sets a template materializes under.
	///
	/// Per flavor axis the binding precedence is: the edge's pinned selection,
	/// then the external constraint, then (with the flavor wildcard) a
	/// fan-out over every declared option, otherwise the declared default.
	/// The cartesian product over the axes gives one selection set per
	/// combination; a flavorless template yields exactly the empty set.
	fn selection_sets(&self, template: TemplateId, pinned: &FlavorSelections) -> Vec<FlavorSelections> {
		let template = &self.templates[template.index()];

		let mut sets = vec![FlavorSelections::empty()];
		for flavor in template.flavor_axes() {
			let options: Vec<FlavorOptionName> = if let Some(option) = pinned.option_for(&flavor.name) {
				vec![option.clone()]
			} else if let Some(option) = self.constraints.option_for(&flavor.name) {
				vec![option.clone()]
			} else if self.options.allow_all_flavors() {
				flavor.options.iter().map(|o| o.name.clone()).collect()
			} else {
				vec![flavor.default_option().name.clone()]
			};

			let mut next = Vec::with_capacity(sets.len() * options.len());
			for set in &sets {
				for option in &options {
					next.push(set.clone().with(FlavorSelection::new(flavor.name.clone(), option.clone())));
				}
			}
			sets = next;
		}
		sets
	}

	fn variant_settings(&self, template: TemplateId) -> BTreeMap<FlavorName, FlavorOptionName> {
		let template = &self.templates[template.index()];
		template.variant_axes()
			.map(|variant| {
				let option = self.constraints.option_for(&variant.name)
					.unwrap_or(&variant.default_option().name);
				(variant.name.clone(), option.clone())
			})
			.collect()
	}

	/// Returns the memoized instance for `(template, selections)`, creating
	/// and wiring it on first request.
	fn expand(&mut self, template: TemplateId, selections: FlavorSelections) -> InstanceId {
		if let Some(existing) = self.memo.get(&(template, selections.clone())) {
			return *existing;
		}

		let name = self.instance_name(template, &selections);
		let supported = self.selected_options_supported(template, &selections);
		let variant_settings = self.variant_settings(template);

		let id = InstanceId::new(self.instances.len());
		self.instances.push(ResolvedPackageInstance::new(id, name.clone(), template, selections.clone(), variant_settings, supported));
		/* Registered before any recursion so cyclic declarations terminate here. */
		self.memo.insert((template, selections.clone()), id);
		self.names.insert(name, id);
		self.templates[template.index()].record_instance_config(&selections);

		/* Wire the active dependency edges. */
		let dependencies = self.templates[template.index()].dependencies().to_vec();
		for dependency in &dependencies {
			if !dependency.active_when.is_subset_of(&selections) {
				continue;
			}
			for child_selections in self.selection_sets(dependency.target, &dependency.target_selections) {
				let child = self.expand(dependency.target, child_selections);
				self.instances[id.index()].add_dependency(child);
			}
		}

		self.apply_extensions(id, template);

		id
	}

	/// Applies this template's flavor extensions against the dependency
	/// instances the new instance was just wired to: whatever option the
	/// owning dependency bound decides which extension option contributes its
	/// extra dependencies and supported flag.
	fn apply_extensions(&mut self, id: InstanceId, template: TemplateId) {
		let extensions = self.templates[template.index()].extensions().to_vec();
		if extensions.is_empty() {
			return;
		}

		let wired = self.instances[id.index()].dependencies().to_vec();
		for extension in &extensions {
			let owner = match self.template_ids.get(extension.flavor.owner()) {
				Some(t) => *t,
				/* Sealing rejected extensions of undeclared packages. */
				None => continue,
			};

			for child in &wired {
				if self.instances[child.index()].template() != owner {
					continue;
				}
				let bound = match self.instances[child.index()].selections().option_for(&extension.flavor) {
					Some(option) => option.clone(),
					None => continue,
				};
				let option = match extension.option(&bound) {
					Some(option) => option.clone(),
					None => continue,
				};

				if !option.supported {
					self.instances[id.index()].mark_unsupported();
				}
				for declaration in &option.dependencies {
					let target = *self.template_ids.get(&declaration.target)
						.expect("sealed universe has no dangling dependency targets");
					let pinned = declaration.flavor_info.clone().unwrap_or_default();
					for child_selections in self.selection_sets(target, &pinned) {
						let extra = self.expand(target, child_selections);
						self.instances[id.index()].add_dependency(extra);
					}
				}
			}
		}
	}

	fn selected_options_supported(&self, template: TemplateId, selections: &FlavorSelections) -> bool {
		let template = &self.templates[template.index()];
		selections.iter().all(|selection| {
			template.flavor(selection.flavor())
				.and_then(|f| f.option(selection.option()))
				.map(|o| o.supported)
				.expect("selections were produced from this template's declared axes")
		})
	}

	/// Picks the instance name, preferring the suffix-free "smart" form for
	/// singleton-flavor bindings while it stays unambiguous.
	fn instance_name(&self, template: TemplateId, selections: &FlavorSelections) -> PackageInstanceName {
		let template = &self.templates[template.index()];

		if selections.len() == 1 {
			let selection = selections.iter().next().expect("len checked");
			let singleton = template.flavor(selection.flavor()).map(|f| f.singleton).unwrap_or(false);
			if singleton {
				let smart = PackageInstanceName::plain(template.name());
				if !self.names.contains_key(&smart) {
					return smart;
				}
				log::debug!(
					"smart name `{}` already taken, falling back to the encoded name for {}",
					smart, selections
				);
			}
		}

		PackageInstanceName::encode(template.name(), selections, &template.flavor_order())
	}
}
