use crate::config::toml_config::CatalogConfig;
use crate::domain::model::{
    normalize_service_name, CatalogEntry, Profile, ResolvedServiceSet, ServiceDescriptor,
    VariantTable,
};
use crate::utils::error::{Result, StackError};
use crate::utils::validation;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const GATEWAY_SERVICE: &str = "caddy";
pub const ACCELERATOR_SERVICE: &str = "ollama";

/// `lookup` 的結果；找不到不算錯誤，由呼叫端決定如何處理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Service(&'a ServiceDescriptor),
    Variant(&'a VariantTable),
    NotFound,
}

/// 邏輯服務名稱到實際 compose 服務的靜態對照表。
///
/// 建立後不會再變動；`dependsOn` 形成一張以邏輯名稱為節點的有向圖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    gateway: Option<String>,
}

impl ServiceCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// 內建目錄，整個 process 共用
    pub fn builtin() -> &'static ServiceCatalog {
        static BUILTIN: OnceLock<ServiceCatalog> = OnceLock::new();
        BUILTIN.get_or_init(builtin_catalog)
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut builder = Self::builder();

        for (name, service) in &config.services {
            match &service.variants {
                Some(variants) => {
                    if !service.containers.is_empty() || !service.depends_on.is_empty() {
                        return Err(StackError::ConfigValidationError {
                            field: format!("catalog.services.{}", name),
                            message: "A variant service cannot also declare containers or depends_on"
                                .to_string(),
                        });
                    }

                    let mut table = Vec::new();
                    for (profile_name, variant) in variants {
                        let profile: Profile = profile_name.parse().map_err(|_| {
                            StackError::InvalidConfigValueError {
                                field: format!("catalog.services.{}.variants", name),
                                value: profile_name.clone(),
                                reason: "Unknown profile".to_string(),
                            }
                        })?;
                        validation::validate_unique(
                            &format!("catalog.services.{}.variants.{}.containers", name, profile_name),
                            &variant.containers,
                        )?;
                        table.push((
                            profile,
                            ServiceDescriptor::new(
                                variant.containers.iter().cloned(),
                                variant.depends_on.iter().map(|d| normalize_service_name(d)),
                            ),
                        ));
                    }
                    builder = builder.variant(name, table);
                }
                None => {
                    validation::validate_unique(
                        &format!("catalog.services.{}.containers", name),
                        &service.containers,
                    )?;
                    builder = builder.service(
                        name,
                        service.containers.iter().cloned(),
                        service.depends_on.iter().map(|d| normalize_service_name(d)),
                    );
                }
            }
        }

        if let Some(gateway) = &config.gateway {
            builder = builder.gateway(gateway);
        }

        builder.build()
    }

    /// 有 `[catalog]` 設定時使用設定檔，否則使用內建目錄
    pub fn load(config: Option<&CatalogConfig>) -> Result<Self> {
        match config {
            Some(config) => {
                let catalog = Self::from_config(config)?;
                tracing::info!("📚 Loaded {} service(s) from the configured catalog", catalog.len());
                Ok(catalog)
            }
            None => Ok(Self::builtin().clone()),
        }
    }

    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.entries.get(name) {
            Some(CatalogEntry::Service(descriptor)) => Lookup::Service(descriptor),
            Some(CatalogEntry::Variant(table)) => Lookup::Variant(table),
            None => Lookup::NotFound,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 指定 profile 下整份目錄會啟動的所有實際服務
    pub fn all_concrete(&self, profile: Profile) -> ResolvedServiceSet {
        let mut all = ResolvedServiceSet::new();
        for entry in self.entries.values() {
            let descriptor = match entry {
                CatalogEntry::Service(descriptor) => Some(descriptor),
                CatalogEntry::Variant(table) => table.select(profile).1,
            };
            for container in descriptor.iter().flat_map(|d| d.containers.iter()) {
                all.insert(container.clone());
            }
        }
        all
    }

    /// 閘道服務的邏輯名稱；僅在目錄中確實存在時回傳
    pub fn gateway(&self) -> Option<&str> {
        self.gateway
            .as_deref()
            .filter(|name| self.entries.contains_key(*name))
    }

    /// 閘道服務對應的實際服務
    pub fn gateway_containers(&self) -> Option<&ServiceDescriptor> {
        match self.lookup(self.gateway()?) {
            Lookup::Service(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<(String, CatalogEntry)>,
    gateway: Option<String>,
}

impl CatalogBuilder {
    pub fn service<I, D>(mut self, name: &str, containers: I, depends_on: D) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let descriptor = ServiceDescriptor::new(containers, depends_on);
        self.entries.push((
            normalize_service_name(name),
            CatalogEntry::Service(normalize_dependencies(descriptor)),
        ));
        self
    }

    pub fn variant(
        mut self,
        name: &str,
        variants: impl IntoIterator<Item = (Profile, ServiceDescriptor)>,
    ) -> Self {
        self.entries.push((
            normalize_service_name(name),
            CatalogEntry::Variant(VariantTable::new(
                variants
                    .into_iter()
                    .map(|(profile, descriptor)| (profile, normalize_dependencies(descriptor))),
            )),
        ));
        self
    }

    pub fn gateway(mut self, name: &str) -> Self {
        self.gateway = Some(normalize_service_name(name));
        self
    }

    /// 拒絕重複名稱與自我相依；循環相依不檢查
    pub fn build(self) -> Result<ServiceCatalog> {
        let mut entries = BTreeMap::new();

        for (name, entry) in self.entries {
            validation::validate_non_empty_string("catalog.services", &name)?;

            let self_dependent = match &entry {
                CatalogEntry::Service(descriptor) => descriptor.depends_on.contains(&name),
                CatalogEntry::Variant(table) => table
                    .variants
                    .values()
                    .any(|descriptor| descriptor.depends_on.contains(&name)),
            };
            if self_dependent {
                return Err(StackError::ConfigValidationError {
                    field: format!("catalog.services.{}.depends_on", name),
                    message: format!("Service '{}' cannot depend on itself", name),
                });
            }

            if entries.insert(name.clone(), entry).is_some() {
                return Err(StackError::ConfigValidationError {
                    field: "catalog.services".to_string(),
                    message: format!("Service '{}' is defined more than once", name),
                });
            }
        }

        if let Some(gateway) = &self.gateway {
            if matches!(entries.get(gateway), Some(CatalogEntry::Variant(_))) {
                return Err(StackError::ConfigValidationError {
                    field: "catalog.gateway".to_string(),
                    message: format!("Gateway '{}' cannot be a profile variant", gateway),
                });
            }
            if !entries.contains_key(gateway) {
                tracing::warn!(
                    "⚠️ Gateway service '{}' is not in the catalog; it will not be added automatically",
                    gateway
                );
            }
        }

        Ok(ServiceCatalog {
            entries,
            gateway: self.gateway,
        })
    }
}

fn builtin_catalog() -> ServiceCatalog {
    let none: [&str; 0] = [];

    ServiceCatalog {
        entries: [
            ("n8n", service(["n8n-import", "n8n"], none)),
            ("open-webui", service(["open-webui"], [ACCELERATOR_SERVICE])),
            ("flowise", service(["flowise"], none)),
            ("qdrant", service(["qdrant"], none)),
            ("neo4j", service(["neo4j"], none)),
            (
                "langfuse",
                service(
                    ["langfuse-web", "langfuse-worker"],
                    ["clickhouse", "minio", "postgres", "redis"],
                ),
            ),
            ("clickhouse", service(["clickhouse"], none)),
            ("minio", service(["minio"], none)),
            ("postgres", service(["postgres"], none)),
            ("redis", service(["redis"], none)),
            ("searxng", service(["searxng"], ["redis"])),
            (GATEWAY_SERVICE, service(["caddy"], none)),
            (
                ACCELERATOR_SERVICE,
                CatalogEntry::Variant(VariantTable::new([
                    (
                        Profile::Cpu,
                        ServiceDescriptor::new(["ollama-cpu", "ollama-pull-llama-cpu"], none),
                    ),
                    (
                        Profile::GpuNvidia,
                        ServiceDescriptor::new(["ollama-gpu", "ollama-pull-llama-gpu"], none),
                    ),
                    (Profile::GpuAmd, ServiceDescriptor::new(["ollama-gpu-amd"], none)),
                    (Profile::None, ServiceDescriptor::default()),
                ])),
            ),
        ]
        .into_iter()
        .map(|(name, entry)| (name.to_string(), entry))
        .collect(),
        gateway: Some(GATEWAY_SERVICE.to_string()),
    }
}

fn service<const N: usize, const M: usize>(containers: [&str; N], depends_on: [&str; M]) -> CatalogEntry {
    CatalogEntry::Service(ServiceDescriptor::new(containers, depends_on))
}

/// 相依名稱與條目名稱使用同一套正規化
fn normalize_dependencies(mut descriptor: ServiceDescriptor) -> ServiceDescriptor {
    descriptor.depends_on = descriptor
        .depends_on
        .iter()
        .map(|dependency| normalize_service_name(dependency))
        .collect();
    descriptor
}
