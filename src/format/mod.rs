//! Output formatting for collected reviews (table, JSON, markdown, CSV).

use crate::amazon::{ReviewBatch, ReviewRecord};
use crate::collector::ProgressUpdate;
use crate::config::OutputFormat;

/// Formats reviews for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single review.
    pub fn format_review(&self, review: &ReviewRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(review),
            OutputFormat::Table => self.table_single(review),
            OutputFormat::Markdown => self.markdown_single(review),
            OutputFormat::Csv => self.csv_reviews(std::slice::from_ref(review)),
        }
    }

    /// Formats multiple reviews.
    pub fn format_reviews(&self, reviews: &[ReviewRecord]) -> String {
        if reviews.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No reviews collected.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_reviews(reviews),
            OutputFormat::Table => self.table_reviews(reviews),
            OutputFormat::Markdown => self.markdown_reviews(reviews),
            OutputFormat::Csv => self.csv_reviews(reviews),
        }
    }

    /// Formats a full batch. JSON emits the complete upload payload;
    /// the text formats prepend a product header to the review list.
    pub fn format_batch(&self, batch: &ReviewBatch) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(batch).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Csv => self.csv_reviews(&batch.reviews),
            _ => {
                let mut out = self.batch_header(batch);
                out.push('\n');
                out.push_str(&self.format_reviews(&batch.reviews));
                out
            }
        }
    }

    fn batch_header(&self, batch: &ReviewBatch) -> String {
        let mut lines = Vec::new();

        match self.format {
            OutputFormat::Markdown => {
                if let Some(title) = &batch.title {
                    lines.push(format!("# {}", title));
                } else {
                    lines.push(format!("# {}", batch.asin));
                }
                lines.push(String::new());
                lines.push(format!("- **ASIN:** {}", batch.asin));
                lines.push(format!("- **Marketplace:** {}", batch.marketplace));
                if let Some(rating) = batch.average_rating {
                    lines.push(format!("- **Average rating:** {:.1}/5", rating));
                }
                if let Some(price) = batch.price {
                    lines.push(format!("- **Price:** {:.2}", price));
                }
            }
            _ => {
                lines.push(format!("ASIN:        {}", batch.asin));
                if let Some(title) = &batch.title {
                    lines.push(format!("Product:     {}", title));
                }
                lines.push(format!("Marketplace: {}", batch.marketplace));
                if let Some(rating) = batch.average_rating {
                    lines.push(format!("Avg rating:  {:.1}/5", rating));
                }
                if let Some(price) = batch.price {
                    lines.push(format!("Price:       {:.2}", price));
                }
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }

    // JSON formatting

    fn json_single(&self, review: &ReviewRecord) -> String {
        serde_json::to_string_pretty(review).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_reviews(&self, reviews: &[ReviewRecord]) -> String {
        serde_json::to_string_pretty(reviews).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_single(&self, review: &ReviewRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("ID:       {}", review.review_id));
        lines.push(format!("Rating:   {}/5", review.rating));
        lines.push(format!("Title:    {}", review.title));
        lines.push(format!("Author:   {}", review.author));
        lines.push(format!("Date:     {}", review.review_date));
        lines.push(format!(
            "Verified: {}",
            if review.verified_purchase { "Yes" } else { "No" }
        ));
        lines.push(format!("Votes:    {}", review.helpful_votes));

        if review.has_media() {
            let mut media = Vec::new();
            if let Some(urls) = &review.image_urls {
                media.push(format!("{} images", urls.len()));
            } else if review.has_images {
                media.push("images".to_string());
            }
            if review.has_video {
                media.push("video".to_string());
            }
            lines.push(format!("Media:    {}", media.join(", ")));
        }

        lines.push(format!("Body:     {}", review.body));

        lines.join("\n")
    }

    fn table_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let id_width = 14;
        let stars_width = 5;
        let votes_width = 5;
        let verified_width = 8;
        let title_width = 50;

        let mut lines = Vec::new();

        // Header
        lines.push(format!(
            "{:<id_width$}  {:<stars_width$}  {:<votes_width$}  {:<verified_width$}  {}",
            "ID", "Stars", "Votes", "Verified", "Title"
        ));
        lines.push(format!(
            "{:-<id_width$}  {:-<stars_width$}  {:-<votes_width$}  {:-<verified_width$}  {:-<title_width$}",
            "", "", "", "", ""
        ));

        // Rows
        for review in reviews {
            let verified_str = if review.verified_purchase { "Yes" } else { "No" };

            let title = truncate(&review.title, title_width);
            let id = truncate(&review.review_id, id_width);

            lines.push(format!(
                "{:<id_width$}  {:>stars_width$}  {:>votes_width$}  {:<verified_width$}  {}",
                id, review.rating, review.helpful_votes, verified_str, title
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} reviews", reviews.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, review: &ReviewRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", review.title));
        lines.push(String::new());

        lines.push(format!("- **Rating:** {}/5", review.rating));
        lines.push(format!("- **Author:** {}", review.author));
        lines.push(format!("- **Date:** {}", review.review_date));
        if review.verified_purchase {
            lines.push("- **Badges:** ✓ Verified Purchase".to_string());
        }
        if review.helpful_votes > 0 {
            lines.push(format!("- **Helpful votes:** {}", review.helpful_votes));
        }
        if let Some(urls) = &review.image_urls {
            lines.push(format!("- **Images:** {}", urls.len()));
        }
        if let Some(url) = &review.video_url {
            lines.push(format!("- **Video:** {}", url));
        }

        lines.push(String::new());
        for body_line in review.body.lines() {
            lines.push(format!("> {}", body_line));
        }

        lines.join("\n")
    }

    fn markdown_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Stars | Votes | Verified | Date | Title |".to_string());
        lines.push("|-------|-------|----------|------|-------|".to_string());

        for review in reviews {
            let verified_str = if review.verified_purchase { "✓" } else { "" };
            let title = truncate(&review.title, 40);

            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                review.rating, review.helpful_votes, verified_str, review.review_date, title
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} reviews collected*", reviews.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "review_id,rating,title,author,date,verified,helpful_votes,has_images,has_video,video_url,body"
            .to_string()
    }

    fn csv_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for review in reviews {
            let title = Self::csv_escape(&review.title);
            let author = Self::csv_escape(&review.author);
            let date = Self::csv_escape(&review.review_date);
            let body = Self::csv_escape(&review.body);
            let video_url = review.video_url.as_deref().unwrap_or_default();

            lines.push(format!(
                "{},{},{},{},{},{},{},{},{},{},{}",
                review.review_id,
                review.rating,
                title,
                author,
                date,
                review.verified_purchase,
                review.helpful_votes,
                review.has_images,
                review.has_video,
                video_url,
                body
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Renders one progress update as a terminal status line.
pub fn progress_line(update: &ProgressUpdate) -> String {
    format!(
        "[{:>3.0}%] star {} page {}/{} | {} reviews | {}",
        update.progress,
        update.star,
        update.page,
        update.pages_per_star,
        update.total_reviews,
        update.message
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        let mut end = max - 3;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}
