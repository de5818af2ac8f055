use crate::engine::unique_id::UniqueId;

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Top-level test source, a suite name for the plan engine.
    Source(String),
    UniqueId(UniqueId),
}

#[derive(Debug, Clone, Builder)]
pub struct DiscoveryRequest {
    #[builder(default = "Vec::new()")]
    engines: Vec<String>,
    #[builder(default = "Vec::new()")]
    selectors: Vec<Selector>,
}

impl DiscoveryRequest {
    pub fn builder() -> DiscoveryRequestBuilder {
        DiscoveryRequestBuilder::default()
    }

    /// An empty engine filter includes every engine.
    pub fn includes_engine(&self, id: &str) -> bool {
        self.engines.is_empty() || self.engines.iter().any(|engine| engine == id)
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().filter_map(|selector| match selector {
            Selector::Source(source) => Some(source.as_str()),
            _ => None,
        })
    }

    pub fn unique_ids(&self) -> impl Iterator<Item = &UniqueId> {
        self.selectors.iter().filter_map(|selector| match selector {
            Selector::UniqueId(id) => Some(id),
            _ => None,
        })
    }
}

impl DiscoveryRequestBuilder {
    pub fn include_engine<S: Into<String>>(&mut self, engine: S) -> &mut Self {
        self.engines
            .get_or_insert_with(Vec::new)
            .push(engine.into());
        self
    }

    pub fn selector(&mut self, selector: Selector) -> &mut Self {
        self.selectors.get_or_insert_with(Vec::new).push(selector);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builder_accumulates_selectors_in_order() {
        let scope = UniqueId::for_engine("testrelay").append("suite", "Math");
        let request = DiscoveryRequest::builder()
            .include_engine("testrelay")
            .selector(Selector::UniqueId(scope.clone()))
            .selector(Selector::Source("Math".to_owned()))
            .build()
            .unwrap();

        assert_eq!(
            request.selectors(),
            &[
                Selector::UniqueId(scope.clone()),
                Selector::Source("Math".to_owned())
            ]
        );
        assert_eq!(request.sources().collect::<Vec<_>>(), vec!["Math"]);
        assert_eq!(request.unique_ids().collect::<Vec<_>>(), vec![&scope]);
    }

    #[test]
    fn test_engine_filter() {
        let request = DiscoveryRequest::builder()
            .include_engine("testrelay")
            .build()
            .unwrap();

        assert!(request.includes_engine("testrelay"));
        assert!(!request.includes_engine("junit"));
        assert!(DiscoveryRequest::builder()
            .build()
            .unwrap()
            .includes_engine("junit"));
    }
}
