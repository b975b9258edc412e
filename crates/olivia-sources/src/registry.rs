//! Ordered registry of source adapters

use olivia_core::{Error, HarmCategory, Result, SourceId, SourceRole};
use std::sync::Arc;
use tracing::info;

use crate::adapter::SourceAdapter;
use crate::fixture::FixtureAdapter;
use crate::judilibre::JudilibreAdapter;
use crate::justice_back::JusticeBackAdapter;
use crate::legifrance::LegifranceAdapter;
use crate::settings::{obfuscate, SourceSettings, SourcesSettings};

/// Adapters keyed by id; registration order is output order
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the live (or demo) adapters for every enabled source
    pub fn from_settings(settings: &SourcesSettings, demo_mode: bool) -> Result<Self> {
        settings.validate(demo_mode)?;

        let mut registry = Self::new();
        for (id, source) in settings.entries() {
            if !source.enabled {
                info!(source = %id, "Source disabled");
                continue;
            }
            let adapter = if demo_mode {
                demo_adapter(id.clone())?
            } else {
                live_adapter(id.clone(), source)?
            };
            registry.register(adapter)?;
        }

        info!(
            sources = registry.len(),
            demo_mode, "Initialized source registry"
        );
        Ok(registry)
    }

    /// Add an adapter; ids must be unique
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Result<()> {
        if self.contains(adapter.id()) {
            return Err(Error::config(format!(
                "source '{}' is registered twice",
                adapter.id()
            )));
        }
        self.adapters.push(adapter);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Result<Self> {
        self.register(adapter)?;
        Ok(self)
    }

    pub fn get(&self, id: &SourceId) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|a| a.id() == id)
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|a| a.id().clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.adapters.iter()
    }

    /// Adapters answering queries for `category`, in registration order
    pub fn serving<'a>(
        &'a self,
        category: &'a HarmCategory,
    ) -> impl Iterator<Item = &'a Arc<dyn SourceAdapter>> + 'a {
        self.adapters.iter().filter(move |a| a.supports(category))
    }

    /// Adapters with the locations role
    pub fn locations(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.adapters
            .iter()
            .filter(|a| a.role() == SourceRole::Locations)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

fn role_of(id: &SourceId) -> Result<SourceRole> {
    match id.as_str() {
        SourceId::LEGIFRANCE => Ok(SourceRole::Legislation),
        SourceId::JUDILIBRE => Ok(SourceRole::CaseLaw),
        SourceId::JUSTICE_BACK => Ok(SourceRole::Locations),
        other => Err(Error::config(format!("unknown source '{}'", other))),
    }
}

fn demo_adapter(id: SourceId) -> Result<Arc<dyn SourceAdapter>> {
    let role = role_of(&id)?;
    info!(source = %id, "Using offline demo data");
    Ok(Arc::new(FixtureAdapter::demo(id, role)))
}

fn live_adapter(id: SourceId, settings: &SourceSettings) -> Result<Arc<dyn SourceAdapter>> {
    info!(
        source = %id,
        client_id = %settings.client_id.as_deref().map(obfuscate).unwrap_or_default(),
        api_key = settings.has_api_key(),
        "Configuring live source"
    );
    let adapter: Arc<dyn SourceAdapter> = match role_of(&id)? {
        SourceRole::Legislation => Arc::new(LegifranceAdapter::with_id(id, settings)?),
        SourceRole::CaseLaw => Arc::new(JudilibreAdapter::with_id(id, settings)?),
        SourceRole::Locations => Arc::new(JusticeBackAdapter::with_id(id, settings)?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(id: &str, role: SourceRole) -> Arc<dyn SourceAdapter> {
        Arc::new(FixtureAdapter::new(id, role))
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let mut registry = SourceRegistry::new()
            .with(fixture("b", SourceRole::CaseLaw))
            .unwrap()
            .with(fixture("a", SourceRole::Legislation))
            .unwrap();
        assert_eq!(registry.ids(), vec![SourceId::new("b"), SourceId::new("a")]);

        let err = registry
            .register(fixture("a", SourceRole::Legislation))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_roles_partition_adapters() {
        let registry = SourceRegistry::new()
            .with(fixture("laws", SourceRole::Legislation))
            .unwrap()
            .with(fixture("places", SourceRole::Locations))
            .unwrap();

        let category = HarmCategory::new("physical");
        let serving: Vec<_> = registry.serving(&category).map(|a| a.id().clone()).collect();
        assert_eq!(serving, vec![SourceId::new("laws")]);
        let locations: Vec<_> = registry.locations().map(|a| a.id().clone()).collect();
        assert_eq!(locations, vec![SourceId::new("places")]);
    }

    #[test]
    fn test_demo_registry_skips_disabled_sources() {
        let mut settings = SourcesSettings::default();
        settings.judilibre.enabled = false;

        let registry = SourceRegistry::from_settings(&settings, true).unwrap();
        assert_eq!(
            registry.ids(),
            vec![
                SourceId::new(SourceId::LEGIFRANCE),
                SourceId::new(SourceId::JUSTICE_BACK)
            ]
        );
    }

    #[test]
    fn test_live_registry_requires_credentials() {
        let settings = SourcesSettings::default();
        assert!(SourceRegistry::from_settings(&settings, false).is_err());
    }

    #[test]
    fn test_live_registry_builds_adapters() {
        let credentials = SourceSettings {
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            ..SourceSettings::default()
        };
        let settings = SourcesSettings {
            legifrance: credentials.clone(),
            judilibre: SourceSettings {
                api_key: Some("key".into()),
                ..SourceSettings::default()
            },
            justice_back: credentials,
        };
        let registry = SourceRegistry::from_settings(&settings, false).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry
                .get(&SourceId::new(SourceId::JUSTICE_BACK))
                .map(|a| a.role()),
            Some(SourceRole::Locations)
        );
    }
}
