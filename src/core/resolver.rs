use crate::core::catalog::{Lookup, ServiceCatalog};
use crate::domain::model::{normalize_service_name, Profile, ResolvedServiceSet};
use std::collections::{HashSet, VecDeque};

/// 一次解析的完整結果，`services` 之外的欄位只用於診斷
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub services: ResolvedServiceSet,
    /// 目錄中不存在、被略過的名稱（依處理順序）
    pub unknown: Vec<String>,
    /// 邏輯名稱的處理順序
    pub visited: Vec<String>,
    pub gateway_injected: bool,
}

/// 依目錄把邏輯服務名稱展開成要啟動的實際服務集合。
///
/// 以 FIFO 佇列做廣度優先的相依閉包。名稱在相依項目入列之前就會被標記為
/// 已處理，所以即使目錄中有循環相依，解析也一定會結束。
pub struct DependencyResolver<'a> {
    catalog: &'a ServiceCatalog,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(catalog: &'a ServiceCatalog) -> Self {
        Self { catalog }
    }

    pub fn resolve<S: AsRef<str>>(&self, requested: &[S], profile: Profile) -> ResolvedServiceSet {
        self.resolve_with_report(requested, profile).services
    }

    pub fn resolve_with_report<S: AsRef<str>>(&self, requested: &[S], profile: Profile) -> Resolution {
        let mut processed: HashSet<String> = HashSet::new();
        let mut resolution = Resolution::default();
        let mut queue: VecDeque<String> = requested
            .iter()
            .map(|name| normalize_service_name(name.as_ref()))
            .collect();

        while let Some(name) = queue.pop_front() {
            if !processed.insert(name.clone()) {
                continue;
            }
            resolution.visited.push(name.clone());

            match self.catalog.lookup(&name) {
                Lookup::Variant(table) => {
                    let (selected, descriptor) = table.select(profile);
                    if selected != profile {
                        tracing::debug!(
                            "'{}' has no variant for profile '{}', using '{}'",
                            name,
                            profile,
                            selected
                        );
                    }

                    match descriptor {
                        Some(descriptor) => {
                            for container in &descriptor.containers {
                                resolution.services.insert(container.clone());
                            }
                            for dependency in &descriptor.depends_on {
                                if !processed.contains(dependency) {
                                    queue.push_back(dependency.clone());
                                }
                            }
                        }
                        None => {
                            tracing::debug!("'{}' contributes nothing under profile '{}'", name, selected);
                        }
                    }
                }
                Lookup::Service(descriptor) => {
                    for container in &descriptor.containers {
                        resolution.services.insert(container.clone());
                    }
                    for dependency in &descriptor.depends_on {
                        if !processed.contains(dependency) {
                            queue.push_back(dependency.clone());
                        }
                    }
                }
                Lookup::NotFound => {
                    tracing::warn!("⚠️ Unknown service '{}', skipping", name);
                    resolution.unknown.push(name);
                }
            }
        }

        // 任何對外服務都需要反向代理一起啟動
        if !resolution.services.is_empty() {
            if let Some(gateway) = self.catalog.gateway_containers() {
                let already_selected = gateway
                    .containers
                    .iter()
                    .any(|container| resolution.services.contains(container));

                if !already_selected && !gateway.containers.is_empty() {
                    for container in &gateway.containers {
                        resolution.services.insert(container.clone());
                    }
                    resolution.gateway_injected = true;
                    tracing::debug!("Adding gateway service(s): {:?}", gateway.containers);
                }
            }
        }

        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{ACCELERATOR_SERVICE, GATEWAY_SERVICE};

    fn set(items: &[&str]) -> ResolvedServiceSet {
        items.iter().copied().collect()
    }

    fn small_catalog() -> ServiceCatalog {
        ServiceCatalog::builder()
            .service("a", ["a1"], Vec::<String>::new())
            .service("b", ["b1"], ["a"])
            .service("g", ["g1"], Vec::<String>::new())
            .gateway("g")
            .build()
            .unwrap()
    }

    #[test]
    fn test_dependency_closure() {
        let catalog = small_catalog();
        let resolver = DependencyResolver::new(&catalog);

        assert_eq!(resolver.resolve(&["b"], Profile::Cpu), set(&["a1", "b1", "g1"]));
    }

    #[test]
    fn test_duplicate_request() {
        let catalog = ServiceCatalog::builder()
            .service("a", ["a1"], Vec::<String>::new())
            .build()
            .unwrap();
        let resolver = DependencyResolver::new(&catalog);

        assert_eq!(resolver.resolve(&["A", "a"], Profile::Cpu), set(&["a1"]));
    }

    #[test]
    fn test_gateway_injected_once() {
        let catalog = small_catalog();
        let resolver = DependencyResolver::new(&catalog);

        let report = resolver.resolve_with_report(&["a"], Profile::Cpu);
        assert_eq!(report.services, set(&["a1", "g1"]));
        assert!(report.gateway_injected);

        let report = resolver.resolve_with_report(&["a", "g"], Profile::Cpu);
        assert_eq!(report.services, set(&["a1", "g1"]));
        assert!(!report.gateway_injected);
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let catalog = small_catalog();
        let resolver = DependencyResolver::new(&catalog);

        let report = resolver.resolve_with_report(&["nope", "a", "missing"], Profile::Cpu);
        assert_eq!(report.services, resolver.resolve(&["a"], Profile::Cpu));
        assert_eq!(report.unknown, vec!["nope".to_string(), "missing".to_string()]);
    }

    #[test]
    fn test_only_unknown_names_resolve_to_empty() {
        let catalog = small_catalog();
        let resolver = DependencyResolver::new(&catalog);

        let report = resolver.resolve_with_report(&["nope"], Profile::Cpu);
        assert!(report.services.is_empty());
        assert!(!report.gateway_injected);
    }

    #[test]
    fn test_cycle_terminates() {
        let catalog = ServiceCatalog::builder()
            .service("a", ["a1"], ["b"])
            .service("b", ["b1"], ["c"])
            .service("c", ["c1"], ["a"])
            .build()
            .unwrap();
        let resolver = DependencyResolver::new(&catalog);

        let report = resolver.resolve_with_report(&["a"], Profile::Cpu);
        assert_eq!(report.services, set(&["a1", "b1", "c1"]));
        assert_eq!(report.visited, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_accelerator_under_none_is_empty_without_gateway() {
        let resolver = DependencyResolver::new(ServiceCatalog::builtin());

        let report = resolver.resolve_with_report(&[ACCELERATOR_SERVICE], Profile::None);
        assert!(report.services.is_empty());
        assert!(!report.gateway_injected);
    }

    #[test]
    fn test_accelerator_under_other_profiles_adds_gateway() {
        let resolver = DependencyResolver::new(ServiceCatalog::builtin());

        for profile in [Profile::Cpu, Profile::GpuNvidia, Profile::GpuAmd] {
            let resolved = resolver.resolve(&[ACCELERATOR_SERVICE], profile);
            assert!(!resolved.is_empty(), "{} should start something", profile);
            assert!(resolved.contains(GATEWAY_SERVICE), "{} should add the gateway", profile);
        }

        assert_eq!(
            resolver.resolve(&[ACCELERATOR_SERVICE], Profile::GpuAmd),
            set(&["ollama-gpu-amd", "caddy"])
        );
    }

    #[test]
    fn test_variant_fallback_to_cpu() {
        let catalog = ServiceCatalog::builder()
            .variant(
                "llm",
                [(
                    Profile::Cpu,
                    crate::domain::model::ServiceDescriptor::new(["llm-cpu"], Vec::<String>::new()),
                )],
            )
            .build()
            .unwrap();
        let resolver = DependencyResolver::new(&catalog);

        assert_eq!(resolver.resolve(&["llm"], Profile::GpuNvidia), set(&["llm-cpu"]));
        assert!(resolver.resolve(&["llm"], Profile::None).is_empty());
    }

    #[test]
    fn test_builtin_langfuse_pulls_dependencies() {
        let resolver = DependencyResolver::new(ServiceCatalog::builtin());

        let resolved = resolver.resolve(&["langfuse"], Profile::Cpu);
        assert_eq!(
            resolved,
            set(&[
                "langfuse-web",
                "langfuse-worker",
                "clickhouse",
                "minio",
                "postgres",
                "redis",
                "caddy",
            ])
        );
    }

    #[test]
    fn test_builtin_open_webui_follows_profile() {
        let resolver = DependencyResolver::new(ServiceCatalog::builtin());

        assert_eq!(
            resolver.resolve(&["open-webui"], Profile::GpuNvidia),
            set(&["open-webui", "ollama-gpu", "ollama-pull-llama-gpu", "caddy"])
        );
        assert_eq!(
            resolver.resolve(&["open-webui"], Profile::None),
            set(&["open-webui", "caddy"])
        );
    }
}
