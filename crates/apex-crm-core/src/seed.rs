//! Demo records written into an empty store on first use.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Client, FileType, Lead, PipelineStage, SeoStats, StrategicTask, UploadedFile,
};

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or_default()
}

fn task(id: &str, text: &str, completed: bool) -> StrategicTask {
    StrategicTask {
        id: id.to_string(),
        task: text.to_string(),
        completed,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn clients() -> Vec<Client> {
    vec![
        Client {
            id: "client-1".into(),
            company: "Innovate Inc.".into(),
            contact_person: "Alice Johnson".into(),
            industry: "Technology".into(),
            website: "https://innovate.example.com".into(),
            email: "alice@innovate.example.com".into(),
            phone: "+1 555 010 1000".into(),
            created_at: at(2024, 1, 15),
            seo_stats: SeoStats {
                indexed_keywords: 1250,
                seo_clicks: 8400,
                strategic_tasks: vec![
                    task("task-1-1", "Fix broken internal links", true),
                    task("task-1-2", "Publish pillar page on cloud security", false),
                    task("task-1-3", "Compress hero images", true),
                ],
                competitors: strings(&["techrival.example.com", "nextgen.example.com"]),
                long_tail_targets: strings(&[
                    "best cloud security tools for startups",
                    "how to audit saas permissions",
                ]),
                low_keyword_difficulty_targets: strings(&["saas audit checklist"]),
                website_quality_rating: 82,
            },
            uploaded_files: vec![UploadedFile {
                id: "file-1-1".into(),
                client_id: "client-1".into(),
                file_name: "keyword-export.csv".into(),
                file_type: FileType::Csv,
                file_size: 48_213,
                upload_date: at(2024, 2, 2),
                url: "/files/client-1/keyword-export.csv".into(),
            }],
        },
        Client {
            id: "client-2".into(),
            company: "Green Leaf Organics".into(),
            contact_person: "Marco Diaz".into(),
            industry: "Retail".into(),
            website: "https://greenleaf.example.com".into(),
            email: "marco@greenleaf.example.com".into(),
            phone: "+1 555 010 2000".into(),
            created_at: at(2024, 2, 3),
            seo_stats: SeoStats {
                indexed_keywords: 430,
                seo_clicks: 2100,
                strategic_tasks: vec![
                    task("task-2-1", "Add product schema markup", false),
                    task("task-2-2", "Claim local business listings", true),
                ],
                competitors: strings(&["freshfarm.example.com"]),
                long_tail_targets: strings(&["organic produce delivery near me"]),
                low_keyword_difficulty_targets: strings(&["heirloom tomato seeds bulk"]),
                website_quality_rating: 64,
            },
            uploaded_files: vec![UploadedFile {
                id: "file-2-1".into(),
                client_id: "client-2".into(),
                file_name: "site-audit.pdf".into(),
                file_type: FileType::Pdf,
                file_size: 912_004,
                upload_date: at(2024, 3, 11),
                url: "/files/client-2/site-audit.pdf".into(),
            }],
        },
        Client {
            id: "client-3".into(),
            company: "Summit Legal Group".into(),
            contact_person: "Priya Natarajan".into(),
            industry: "Legal".into(),
            website: "https://summitlegal.example.com".into(),
            email: "priya@summitlegal.example.com".into(),
            phone: "+1 555 010 3000".into(),
            created_at: at(2024, 3, 21),
            seo_stats: SeoStats {
                indexed_keywords: 310,
                seo_clicks: 950,
                strategic_tasks: vec![task("task-3-1", "Write practice area FAQ pages", false)],
                competitors: strings(&["peaklaw.example.com", "ridgecounsel.example.com"]),
                long_tail_targets: strings(&["small business contract lawyer denver"]),
                low_keyword_difficulty_targets: Vec::new(),
                website_quality_rating: 71,
            },
            uploaded_files: Vec::new(),
        },
        Client {
            id: "client-4".into(),
            company: "Harbor Dental".into(),
            contact_person: "Sam Okafor".into(),
            industry: "Healthcare".into(),
            website: "https://harbordental.example.com".into(),
            email: "sam@harbordental.example.com".into(),
            phone: "+1 555 010 4000".into(),
            created_at: at(2024, 4, 8),
            seo_stats: SeoStats {
                indexed_keywords: 180,
                seo_clicks: 640,
                strategic_tasks: vec![
                    task("task-4-1", "Collect patient reviews", true),
                    task("task-4-2", "Speed up mobile booking page", false),
                ],
                competitors: strings(&["brightsmile.example.com"]),
                long_tail_targets: strings(&["emergency dentist open saturday"]),
                low_keyword_difficulty_targets: strings(&["invisalign cost harbor city"]),
                website_quality_rating: 58,
            },
            uploaded_files: Vec::new(),
        },
        Client {
            id: "client-5".into(),
            company: "Nomad Travel Co.".into(),
            contact_person: "Lena Fischer".into(),
            industry: "Travel".into(),
            website: "https://nomadtravel.example.com".into(),
            email: "lena@nomadtravel.example.com".into(),
            phone: "+1 555 010 5000".into(),
            created_at: at(2024, 5, 19),
            seo_stats: SeoStats {
                indexed_keywords: 2040,
                seo_clicks: 15_300,
                strategic_tasks: vec![
                    task("task-5-1", "Localize top 20 landing pages", false),
                    task("task-5-2", "Consolidate duplicate blog tags", true),
                ],
                competitors: strings(&["wanderlust.example.com", "globetrek.example.com"]),
                long_tail_targets: strings(&["two week itinerary portugal by train"]),
                low_keyword_difficulty_targets: strings(&["azores hiking guide"]),
                website_quality_rating: 90,
            },
            uploaded_files: vec![UploadedFile {
                id: "file-5-1".into(),
                client_id: "client-5".into(),
                file_name: "sitemap.xml".into(),
                file_type: FileType::Xml,
                file_size: 22_518,
                upload_date: at(2024, 6, 1),
                url: "/files/client-5/sitemap.xml".into(),
            }],
        },
    ]
}

fn lead(
    id: &str,
    company: &str,
    contact: &str,
    value: f64,
    stage: PipelineStage,
    source: &str,
    created_at: DateTime<Utc>,
) -> Lead {
    let slug = company
        .split_whitespace()
        .next()
        .unwrap_or("contact")
        .to_lowercase();
    Lead {
        id: id.to_string(),
        company: company.to_string(),
        contact_person: contact.to_string(),
        email: format!("hello@{}.example.com", slug),
        phone: "+1 555 020 0000".to_string(),
        estimated_value: value,
        stage,
        source: source.to_string(),
        created_at,
    }
}

pub fn leads() -> Vec<Lead> {
    vec![
        lead("lead-1", "Bluewave Analytics", "Tom Reyes", 12_000.0, PipelineStage::LeadIn, "Website", at(2024, 6, 2)),
        lead("lead-2", "Copperline Studios", "Ada Brooks", 8_500.0, PipelineStage::ContactMade, "Referral", at(2024, 6, 5)),
        lead("lead-3", "Northstar Fitness", "Kenji Sato", 15_000.0, PipelineStage::ProposalSent, "LinkedIn", at(2024, 6, 9)),
        lead("lead-4", "Atlas Logistics", "Maria Costa", 42_000.0, PipelineStage::Negotiation, "Conference", at(2024, 6, 14)),
        lead("lead-5", "Pinecrest Realty", "Owen Hughes", 9_800.0, PipelineStage::Won, "Referral", at(2024, 5, 28)),
        lead("lead-6", "Vertex Robotics", "Nia Campbell", 27_500.0, PipelineStage::Lost, "Cold Email", at(2024, 5, 20)),
        lead("lead-7", "Saffron Kitchen", "Ravi Mehta", 4_200.0, PipelineStage::ContactMade, "Website", at(2024, 6, 18)),
        lead("lead-8", "Lumen Solar", "Grace Lin", 31_000.0, PipelineStage::Won, "Partner", at(2024, 6, 20)),
    ]
}
