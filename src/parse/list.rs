//! Search-result page scraping
//!
//! Search results arrive as server-rendered HTML. Each result card carries
//! the message id on its own element plus author, permalink, publish time,
//! content, and three engagement counts. A response without the pagination
//! marker (`div.m-page`) is an interstitial or empty page and yields no
//! items.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

fn uid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\d+)/?").expect("valid regex"))
}

fn mblogid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\w+)\?").expect("valid regex"))
}

/// Parses one search-result page into item maps
pub fn parse_list_html(html: &str) -> Vec<Map<String, Value>> {
    let document = Html::parse_document(html);

    let Ok(page_marker) = Selector::parse("div.m-page") else {
        return Vec::new();
    };
    if document.select(&page_marker).next().is_none() {
        return Vec::new();
    }

    let Ok(card_selector) =
        Selector::parse(r#"#pl_feedlist_index div[action-type="feed_list_item"]"#)
    else {
        return Vec::new();
    };

    document
        .select(&card_selector)
        .map(|card| parse_card(&card))
        .collect()
}

fn parse_card(card: &ElementRef) -> Map<String, Value> {
    let nick_anchor = select_first(card, "a[nick-name]");
    let from_links: Vec<ElementRef> = select_all(card, "div.from a");

    let mid = card
        .value()
        .attr("mid")
        .map(str::to_string)
        .or_else(|| attr_of(card, "div[mid]", "mid"));

    let personal_name = nick_anchor.and_then(|a| a.value().attr("nick-name").map(str::to_string));
    let personal_href = nick_anchor
        .and_then(|a| a.value().attr("href"))
        .map(|href| format!("https:{}", href));
    let uid = nick_anchor
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| uid_re().captures(href))
        .map(|caps| caps[1].to_string());

    let permalink = from_links.first().and_then(|a| a.value().attr("href"));
    let weibo_href = permalink.map(|href| format!("https:{}", href));
    let mblogid = permalink
        .and_then(|href| mblogid_re().captures(href))
        .map(|caps| caps[1].to_string());
    let publish_time = from_links
        .first()
        .map(|a| collapse_whitespace(&element_text(a)));
    let content_from = from_links
        .get(1)
        .map(|a| collapse_whitespace(&element_text(a)));

    let content_full = select_first(card, r#"p[node-type="feed_list_content_full"]"#)
        .map(|p| clean_content(&element_text(&p)));
    let content_show = select_first(card, r#"p[node-type="feed_list_content"]"#)
        .map(|p| clean_content(&element_text(&p)));
    let content_all = content_full.filter(|c| !c.is_empty()).or(content_show);

    let act_items: Vec<ElementRef> = select_all(card, "div.card-act ul li");
    let retweet_num = act_items.first().and_then(|li| first_number(&element_text(li)));
    let comment_num = act_items.get(1).and_then(|li| first_number(&element_text(li)));
    let star_num = act_items.get(2).and_then(|li| first_number(&element_text(li)));

    let mut item = Map::new();
    item.insert("mid".to_string(), json!(mid));
    item.insert("uid".to_string(), json!(uid));
    item.insert("mblogid".to_string(), json!(mblogid));
    item.insert("personal_name".to_string(), json!(personal_name));
    item.insert("personal_href".to_string(), json!(personal_href));
    item.insert("weibo_href".to_string(), json!(weibo_href));
    item.insert("publish_time".to_string(), json!(publish_time));
    item.insert("content_from".to_string(), json!(content_from));
    item.insert("content_all".to_string(), json!(content_all));
    item.insert("retweet_num".to_string(), json!(retweet_num));
    item.insert("comment_num".to_string(), json!(comment_num));
    item.insert("star_num".to_string(), json!(star_num));
    item
}

fn select_first<'a>(card: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    card.select(&selector).next()
}

fn select_all<'a>(card: &ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => card.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn attr_of(card: &ElementRef, selector: &str, attr: &str) -> Option<String> {
    select_first(card, selector).and_then(|el| el.value().attr(attr).map(str::to_string))
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_content(text: &str) -> String {
    let text = text.replace('\u{200b}', "");
    let text = text.replace("收起d", "");
    collapse_whitespace(&text)
}

fn first_number(text: &str) -> Option<i64> {
    digits_re()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <html><body>
      <div id="pl_feedlist_index">
        <div action-type="feed_list_item" mid="5012345678">
          <a nick-name="SomeUser" href="//weibo.com/7654321?refer_flag=1001"></a>
          <p node-type="feed_list_content">short text</p>
          <p node-type="feed_list_content_full">the full&#8203; text 收起d</p>
          <div class="from">
            <a href="//weibo.com/7654321/OiZre8dir?mod=weibotime">03月21日 18:00</a>
            <a href="//weibo.com/app">iPhone客户端</a>
          </div>
          <div class="card-act"><ul>
            <li>转发 12</li><li>评论 34</li><li>赞 56</li>
          </ul></div>
        </div>
      </div>
      <div class="m-page">pager</div>
    </body></html>"#;

    #[test]
    fn test_parses_result_card() {
        let items = parse_list_html(SAMPLE);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item["mid"], "5012345678");
        assert_eq!(item["uid"], "7654321");
        assert_eq!(item["mblogid"], "OiZre8dir");
        assert_eq!(item["personal_name"], "SomeUser");
        assert_eq!(item["weibo_href"], "https://weibo.com/7654321/OiZre8dir?mod=weibotime");
        assert_eq!(item["retweet_num"], 12);
        assert_eq!(item["comment_num"], 34);
        assert_eq!(item["star_num"], 56);
        assert_eq!(item["content_all"], "the full text");
    }

    #[test]
    fn test_page_without_pager_marker_yields_nothing() {
        let html = r#"<html><body><div id="pl_feedlist_index">
            <div action-type="feed_list_item" mid="1"></div>
        </div></body></html>"#;
        assert!(parse_list_html(html).is_empty());
    }

    #[test]
    fn test_card_with_missing_fields_keeps_nulls() {
        let html = r#"<html><body>
          <div id="pl_feedlist_index">
            <div action-type="feed_list_item"></div>
          </div>
          <div class="m-page"></div>
        </body></html>"#;
        let items = parse_list_html(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["mid"], Value::Null);
        assert_eq!(items[0]["uid"], Value::Null);
        assert_eq!(items[0]["retweet_num"], Value::Null);
    }
}
