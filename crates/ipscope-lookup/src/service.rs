//! The lookup pipeline: validate, geolocate with fallback, enrich, redact,
//! add weather and local time.

use ipscope_core::Config;
use ipscope_weather::{WeatherProvider, WeatherTimeResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::cache::{CacheKey, TtlCache};
use crate::error::LookupError;
use crate::privacy::{annotate, mask_postal, sanitize};
use crate::providers::{
    http_client, GeoProvider, IpApiComProvider, IpWhoisProvider, IpapiCoProvider, IpinfoProvider,
    WhoisProvider,
};
use crate::resolver::SelfIpResolver;
use crate::types::{IpRecord, LookupResponse, ProviderResult};
use crate::validate::is_valid;
use crate::weather::WeatherSource;

/// At most this many geolocation providers are consulted per lookup
pub const MAX_GEO_ATTEMPTS: usize = 3;

/// Cache lifetimes used by the pipeline
#[derive(Debug, Clone)]
pub struct LookupTtls {
    pub geo: Duration,
    pub whois: Duration,
    pub weather: Duration,
}

impl Default for LookupTtls {
    fn default() -> Self {
        Self {
            geo: Duration::from_secs(3600),
            whois: Duration::from_secs(3600),
            weather: Duration::from_secs(600),
        }
    }
}

pub struct IpLookupService {
    cache: Arc<TtlCache>,
    providers: Vec<Box<dyn GeoProvider>>,
    whois: Box<dyn WhoisProvider>,
    weather: Box<dyn WeatherSource>,
    resolver: SelfIpResolver,
    ttls: LookupTtls,
}

impl std::fmt::Debug for IpLookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpLookupService")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field("whois", &self.whois.id())
            .field("cache", &self.cache)
            .finish()
    }
}

impl IpLookupService {
    pub fn new(
        cache: Arc<TtlCache>,
        providers: Vec<Box<dyn GeoProvider>>,
        whois: Box<dyn WhoisProvider>,
        weather: Box<dyn WeatherSource>,
        resolver: SelfIpResolver,
        ttls: LookupTtls,
    ) -> Self {
        Self {
            cache,
            providers,
            whois,
            weather,
            resolver,
            ttls,
        }
    }

    /// Wire up the real upstreams described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        let client = |timeout: Duration| {
            http_client(timeout).map_err(|e| LookupError::Internal(format!("HTTP client: {}", e)))
        };
        let endpoints = &config.endpoints;

        let geo_client = client(config.timeouts.geo())?;
        let providers: Vec<Box<dyn GeoProvider>> = vec![
            Box::new(IpapiCoProvider::new(geo_client.clone(), &endpoints.ipapi_co)),
            Box::new(IpApiComProvider::new(geo_client.clone(), &endpoints.ip_api_com)),
            Box::new(IpinfoProvider::new(geo_client, &endpoints.ipinfo)),
        ];

        let whois = Box::new(IpWhoisProvider::new(
            client(config.timeouts.whois())?,
            &endpoints.ipwhois,
        ));

        let weather = WeatherProvider::new(
            &endpoints.openweather,
            config.weather.api_key.clone(),
            &config.weather.units,
            config.timeouts.weather(),
        )
        .map_err(|e| LookupError::Internal(e.to_string()))?;
        if !weather.has_api_key() {
            tracing::warn!("No weather API key configured; weather data will be unavailable");
        }

        let resolver = SelfIpResolver::new(
            client(config.timeouts.ipv4_echo())?,
            &endpoints.ipv4_echo,
            client(config.timeouts.ipv6_echo())?,
            &endpoints.ipv6_echo,
            config.cache.self_ip_ttl(),
        );

        let ttls = LookupTtls {
            geo: config.cache.geo_ttl(),
            whois: config.cache.whois_ttl(),
            weather: config.cache.weather_ttl(),
        };

        Ok(Self::new(
            Arc::new(TtlCache::new()),
            providers,
            whois,
            Box::new(weather),
            resolver,
            ttls,
        ))
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Enrich one address.
    #[instrument(skip(self), level = "info")]
    pub async fn lookup(&self, ip: &str) -> Result<IpRecord, LookupError> {
        if !is_valid(ip) {
            return Err(LookupError::InvalidIp);
        }

        let mut record = IpRecord::new(ip);

        let located = match self.geolocate(ip).await {
            Some(geo) => {
                record.merge_geo(geo);
                true
            }
            None => {
                tracing::warn!("No geolocation provider answered for {}", ip);
                false
            }
        };

        if located {
            let key = CacheKey::new(self.whois.id(), ip);
            match self
                .cache
                .get_or_compute(key, self.ttls.whois, || self.whois.whois(ip))
                .await
            {
                Ok(whois) => record.merge_whois(whois),
                Err(e) => tracing::debug!("WHOIS enrichment skipped: {}", e),
            }
        }

        let mut record = annotate(sanitize(record));

        let weather = match record.weather_inputs() {
            Some((lat, lon, tz)) => {
                self.weather
                    .fetch(&self.cache, self.ttls.weather, lat, lon, tz)
                    .await
            }
            None => WeatherTimeResult::unknown(),
        };
        record.apply_weather(weather);

        record.postal = mask_postal(&record.postal);

        Ok(record)
    }

    /// Enrich this host's own public address.
    #[instrument(skip(self), level = "info")]
    pub async fn lookup_self(&self) -> Result<IpRecord, LookupError> {
        let addrs = self.resolver.resolve(&self.cache).await?;
        let mut record = self.lookup(&addrs.ipv4).await?;
        record.ipv6 = addrs.ipv6;
        Ok(record)
    }

    pub async fn lookup_response(&self, ip: &str) -> LookupResponse {
        self.lookup(ip).await.into()
    }

    pub async fn self_response(&self) -> LookupResponse {
        self.lookup_self().await.into()
    }

    pub fn clear_cache(&self) {
        self.cache.clear_all();
    }

    /// Providers in priority order; the first success wins.
    async fn geolocate(&self, ip: &str) -> Option<ProviderResult> {
        for provider in self.providers.iter().take(MAX_GEO_ATTEMPTS) {
            let key = CacheKey::new(provider.id(), ip);
            match self
                .cache
                .get_or_compute(key, self.ttls.geo, || provider.locate(ip))
                .await
            {
                Ok(result) => {
                    tracing::debug!("{} located {}", provider.id(), ip);
                    return Some(result);
                }
                Err(e) => tracing::debug!("{} failed for {}: {}", provider.id(), ip, e),
            }
        }
        None
    }
}
