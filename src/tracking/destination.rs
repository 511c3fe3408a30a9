use url::Url;

pub const UTM_SOURCE: &str = "mdmc_smartlink";
pub const UTM_MEDIUM: &str = "click";

/// Build the final redirect target: the stored destination URL with UTM
/// attribution appended. `debug_tracking_id` additionally appends
/// `mdmc_tracking_id`; it must only be passed when the debug flag is on.
pub fn build_destination_url(
    stored_url: &str,
    smartlink_id: &str,
    service_name: &str,
    debug_tracking_id: Option<&str>,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(stored_url)?;

    url.query_pairs_mut()
        .append_pair("utm_source", UTM_SOURCE)
        .append_pair("utm_medium", UTM_MEDIUM)
        .append_pair("utm_campaign", smartlink_id)
        .append_pair("utm_content", service_name);

    if let Some(tracking_id) = debug_tracking_id {
        url.query_pairs_mut()
            .append_pair("mdmc_tracking_id", tracking_id);
    }

    Ok(url.to_string())
}
