/// Environment host suffix to regional Flow API prefix, one entry per
/// geographic deployment.
pub const REGION_TABLE: &[(&str, &str)] = &[
    ("crm.dynamics.com", "us"),
    ("crm2.dynamics.com", "us"),
    ("crm3.dynamics.com", "us"),
    ("crm4.dynamics.com", "emea"),
    ("crm5.dynamics.com", "asia"),
    ("crm6.dynamics.com", "japan"),
    ("crm7.dynamics.com", "japan"),
    ("crm8.dynamics.com", "india"),
    ("crm9.dynamics.com", "gov"),
    ("crm11.dynamics.com", "uk"),
    ("crm12.dynamics.com", "fr"),
    ("crm14.dynamics.com", "za"),
    ("crm15.dynamics.com", "uae"),
    ("crm16.dynamics.com", "de"),
    ("crm17.dynamics.com", "che"),
    ("crm19.dynamics.com", "kor"),
    ("crm20.dynamics.com", "no"),
    ("crm21.dynamics.com", "sg"),
];

pub const DEFAULT_FLOW_API_BASE: &str = "https://api.flow.microsoft.com";

pub fn regional_flow_base(region: &str) -> String {
    format!("https://{region}.api.flow.microsoft.com")
}

/// Lower-cased host of `url`; bare hostnames are accepted too.
pub fn host_of(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let parsed = url::Url::parse(trimmed)
        .or_else(|_| url::Url::parse(&format!("https://{trimmed}")))
        .ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}

/// First table entry whose domain is the host or a dot-bounded suffix of it.
pub fn match_region(host: &str) -> Option<(&'static str, &'static str)> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    REGION_TABLE.iter().copied().find(|(domain, _)| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
