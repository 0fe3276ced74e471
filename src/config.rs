use anyhow::Result;
use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use ipnet::IpNet;
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub admin_api_key: String,
    pub metrics_api_key: String,
    pub redis_url: Option<String>,
    pub wa_gateway_url: Option<String>,
    pub wa_device_id: Option<String>,
    pub topup_callback_secret: String,
    pub callback_allowed_ips: AllowedIps,
    pub initial_token_balance: BigDecimal,
}

/// IP allowlist for the payment gateway callback endpoint.
#[derive(Debug, Clone)]
pub enum AllowedIps {
    Any,
    Cidrs(Vec<IpNet>),
}

impl AllowedIps {
    pub fn is_allowed(&self, addr: IpAddr) -> bool {
        match self {
            AllowedIps::Any => true,
            AllowedIps::Cidrs(cidrs) => cidrs.iter().any(|net| net.contains(&addr)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        let wa_gateway_url = match env::var("WA_GATEWAY_URL") {
            Ok(raw) if !raw.trim().is_empty() => {
                // Reject unparseable gateway URLs at startup rather than on first send
                Url::parse(raw.trim())?;
                Some(raw.trim().to_string())
            }
            _ => None,
        };

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            admin_api_key: env::var("ADMIN_API_KEY")?,
            metrics_api_key: env::var("METRICS_API_KEY")
                .unwrap_or_else(|_| "metrics-secret-key".to_string()),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            wa_gateway_url,
            wa_device_id: env::var("WA_DEVICE_ID").ok().filter(|v| !v.trim().is_empty()),
            topup_callback_secret: env::var("TOPUP_CALLBACK_SECRET")?,
            callback_allowed_ips: parse_allowed_ips(
                &env::var("CALLBACK_ALLOWED_IPS").unwrap_or_else(|_| "*".to_string()),
            )?,
            initial_token_balance: BigDecimal::from_str(
                &env::var("INITIAL_TOKEN_BALANCE").unwrap_or_else(|_| "10".to_string()),
            )?,
        })
    }
}

fn parse_allowed_ips(raw: &str) -> Result<AllowedIps> {
    let value = raw.trim();
    if value == "*" {
        return Ok(AllowedIps::Any);
    }

    let cidrs = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse::<IpNet>)
        .collect::<Result<Vec<_>, _>>()?;

    if cidrs.is_empty() {
        anyhow::bail!("CALLBACK_ALLOWED_IPS must be '*' or a comma-separated list of CIDRs");
    }

    Ok(AllowedIps::Cidrs(cidrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_any_address() {
        let allowed = parse_allowed_ips("*").unwrap();
        assert!(allowed.is_allowed("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn cidr_list_restricts_addresses() {
        let allowed = parse_allowed_ips("10.0.0.0/8, 192.168.1.0/24").unwrap();
        assert!(allowed.is_allowed("10.1.2.3".parse().unwrap()));
        assert!(allowed.is_allowed("192.168.1.250".parse().unwrap()));
        assert!(!allowed.is_allowed("192.168.2.1".parse().unwrap()));
        assert!(!allowed.is_allowed("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn rejects_empty_cidr_list() {
        assert!(parse_allowed_ips(" , ").is_err());
        assert!(parse_allowed_ips("not-a-cidr").is_err());
    }
}
