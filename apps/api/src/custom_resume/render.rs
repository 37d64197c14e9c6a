//! LaTeX source for a custom resume. Sections appear in a fixed order and
//! empty ones are left out; the heading is always present because it carries
//! the owner's name and email.

use resume_domain::latex::{escape_latex, escape_url};
use resume_domain::{
    Award, Certification, Education, Experience, Heading, Project, Record, ResumeSections, Skill,
    Volunteer,
};

const PREAMBLE: &str = r#"\documentclass[letterpaper,11pt]{article}

\usepackage{latexsym}
\usepackage[empty]{fullpage}
\usepackage{titlesec}
\usepackage[usenames,dvipsnames]{color}
\usepackage{enumitem}
\usepackage[hidelinks]{hyperref}
\usepackage{fancyhdr}
\usepackage[english]{babel}
\usepackage{tabularx}

\pagestyle{fancy}
\fancyhf{}
\renewcommand{\headrulewidth}{0pt}
\renewcommand{\footrulewidth}{0pt}

\addtolength{\oddsidemargin}{-0.5in}
\addtolength{\evensidemargin}{-0.5in}
\addtolength{\textwidth}{1in}
\addtolength{\topmargin}{-.5in}
\addtolength{\textheight}{1.0in}

\urlstyle{same}
\raggedbottom
\raggedright
\setlength{\tabcolsep}{0in}

\titleformat{\section}{\vspace{-4pt}\scshape\raggedright\large}{}{0em}{}[\color{black}\titlerule \vspace{-5pt}]

\newcommand{\resumeItem}[2]{\item\small{\textbf{#1}{#2 \vspace{-2pt}}}}
\newcommand{\resumeSubheading}[4]{
  \vspace{-1pt}\item
    \begin{tabular*}{0.97\textwidth}[t]{l@{\extracolsep{\fill}}r}
      \textbf{#1} & #2 \\
      \textit{\small#3} & \textit{\small #4} \\
    \end{tabular*}\vspace{-5pt}
}
\newcommand{\resumeSubItem}[2]{\resumeItem{#1}{#2}\vspace{-4pt}}
\renewcommand{\labelitemii}{$\circ$}
\newcommand{\resumeSubHeadingListStart}{\begin{itemize}[leftmargin=*]}
\newcommand{\resumeSubHeadingListEnd}{\end{itemize}}
\newcommand{\resumeItemListStart}{\begin{itemize}}
\newcommand{\resumeItemListEnd}{\end{itemize}\vspace{-5pt}}
"#;

/// Whose resume this is; the heading shows it.
pub struct Author<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
}

fn date_range(start: &str, end: &str) -> String {
    format!("{} -- {}", escape_latex(start), escape_latex(end))
}

/// Link text for a heading URL. Well-known profiles get a prefix.
fn link_text(label: &str, url: &str) -> String {
    let lower = url.to_lowercase();
    if lower.contains("linkedin") {
        format!("LinkedIn: {}", escape_latex(url))
    } else if lower.contains("github") {
        format!("GitHub: ~~{}", escape_latex(url))
    } else if label.trim().is_empty() {
        escape_latex(url)
    } else {
        escape_latex(label)
    }
}

fn heading(headings: &[Record<Heading>], author: &Author<'_>) -> String {
    let heading = headings.first().map(|r| &r.data);
    let mut out = vec![
        r"\begin{tabular*}{\textwidth}{l@{\extracolsep{\fill}}r}".to_string(),
        format!(
            r"  \textbf{{\LARGE {}}} & Email: \href{{mailto:{}}}{{{}}}\\",
            escape_latex(author.full_name),
            escape_url(author.email),
            escape_latex(author.email),
        ),
    ];

    let links: Vec<String> = heading
        .map(|h| {
            h.custom_links
                .iter()
                .map(|l| format!(r"  \href{{{}}}{{{}}}", escape_url(&l.url), link_text(&l.label, &l.url)))
                .collect()
        })
        .unwrap_or_default();
    let mobile = heading
        .and_then(|h| h.mobile.as_deref())
        .filter(|m| !m.trim().is_empty())
        .map(escape_latex);

    match (links.is_empty(), mobile) {
        (false, Some(mobile)) => out.push(format!(r"{} & Mobile:~~~{mobile} \\", links.join(r" \\"))),
        (false, None) => out.push(format!(r"{} \\", links.join(r" \\"))),
        (true, Some(mobile)) => out.push(format!(r"  & Mobile:~~~{mobile} \\")),
        (true, None) => {}
    }
    out.push(r"\end{tabular*}".to_string());
    out.join("\n")
}

fn format_gpa(value: f64) -> String {
    // 9.0 renders as "9", 8.75 as "8.75".
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn education(items: &[Record<Education>]) -> String {
    let mut out = vec![
        r"\section{Education}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for Record { data: edu, .. } in items {
        let mut degree = escape_latex(&edu.degree);
        match (edu.gpa, edu.max_gpa) {
            (Some(gpa), Some(max)) => {
                degree.push_str(&format!(";  GPA: {}/{}", format_gpa(gpa), format_gpa(max)))
            }
            (Some(gpa), None) => degree.push_str(&format!(";  GPA: {}", format_gpa(gpa))),
            _ => {}
        }
        out.push(r"    \resumeSubheading".to_string());
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&edu.institution),
            escape_latex(&edu.location)
        ));
        out.push(format!(
            "      {{{degree}}}{{{}}}",
            date_range(&edu.start_date, &edu.end_date)
        ));
        if !edu.courses.is_empty() {
            let courses: Vec<String> = edu.courses.iter().map(|c| escape_latex(c)).collect();
            out.push(format!(
                r"      {{\footnotesize \textit{{\textbf{{Courses:}} {}}}}}",
                courses.join(", ")
            ));
        }
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

fn experience(items: &[Record<Experience>]) -> String {
    let mut out = vec![
        r"\vspace{-5pt}".to_string(),
        r"\section{Experience}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for Record { data: exp, .. } in items {
        out.push(r"    \resumeSubheading".to_string());
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&exp.company),
            escape_latex(&exp.location)
        ));
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&exp.position),
            date_range(&exp.start_date, &exp.end_date)
        ));
        if !exp.projects.is_empty() {
            out.push(r"      \resumeItemListStart".to_string());
            for p in &exp.projects {
                out.push(format!(
                    r"        \resumeItem{{{}: }}{{{}}}",
                    escape_latex(&p.title),
                    escape_latex(&p.description)
                ));
            }
            out.push(r"      \resumeItemListEnd".to_string());
        }
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

fn projects(items: &[Record<Project>]) -> String {
    let mut out = vec![
        r"\vspace{3pt}".to_string(),
        r"\section{Projects}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for Record { data: p, .. } in items {
        let link = match p.link.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(url) => format!(
                r"\href{{{}}}{{{}}}",
                escape_url(url),
                escape_latex(p.link_label.as_deref().unwrap_or("Link"))
            ),
            None => String::new(),
        };
        out.push(r"    \resumeSubheading".to_string());
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&p.name),
            date_range(&p.start_date, &p.end_date)
        ));
        out.push(format!("      {{Tech: {}}}{{{link}}}", escape_latex(&p.tech_stack)));
        if !p.subpoints.is_empty() {
            out.push(r"      \resumeItemListStart".to_string());
            for point in &p.subpoints {
                out.push(format!(r"        \resumeItem{{}}{{{}}}", escape_latex(point)));
            }
            out.push(r"      \resumeItemListEnd".to_string());
        }
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

fn skills(items: &[Record<Skill>]) -> String {
    let mut out = vec![
        r"\vspace{-5pt}".to_string(),
        r"\section{Skills Summary}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for Record { data: skill, .. } in items {
        let category = escape_latex(&skill.category);
        let spacing = match skill.category.chars().count() {
            0..=10 => "~~~~~~",
            11..=15 => "~~~~",
            _ => "~~",
        };
        let list: Vec<String> = skill.items.iter().map(|i| escape_latex(i)).collect();
        out.push(format!(
            r"    \resumeSubItem{{{category}}}{{{spacing}{}}}",
            list.join(", ")
        ));
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

fn certifications(items: &[Record<Certification>]) -> String {
    let mut out = vec![
        r"\vspace{-5pt}".to_string(),
        r"\section{Certifications}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for Record { data: c, .. } in items {
        let platform = escape_latex(&c.platform);
        let org = match c.instructor.as_deref().filter(|i| !i.trim().is_empty()) {
            Some(instructor) => format!(
                r"Instructor: {} \hspace{{48pt}}Platform: {platform}",
                escape_latex(instructor)
            ),
            None => format!("Platform: {platform}"),
        };
        let link = c
            .certification_link
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(|url| format!(r"\href{{{}}}{{Certification Link}}", escape_url(url)))
            .unwrap_or_default();
        out.push(r"    \resumeSubheading".to_string());
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&c.title),
            date_range(&c.start_date, &c.end_date)
        ));
        out.push(format!("      {{{org}}}{{{link}}}"));
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

fn awards(items: &[Record<Award>]) -> String {
    let mut out = vec![
        r"\section{Honors and Awards}".to_string(),
        r"\begin{description}[font=$\bullet$]".to_string(),
    ];
    for Record { data: a, .. } in items {
        out.push(format!(
            r"\item {{{} \hfill \raggedleft {}}}",
            escape_latex(&a.title),
            escape_latex(&a.date)
        ));
        out.push(r"\vspace{-5pt}".to_string());
    }
    out.push(r"\end{description}".to_string());
    out.join("\n")
}

fn volunteers(items: &[Record<Volunteer>]) -> String {
    let mut out = vec![
        r"\vspace{-5pt}".to_string(),
        r"\section{Volunteer Experience}".to_string(),
        r"  \resumeSubHeadingListStart".to_string(),
    ];
    for (i, Record { data: v, .. }) in items.iter().enumerate() {
        out.push(r"    \resumeSubheading".to_string());
        out.push(format!(
            "      {{{}, {}}}{{{}}}",
            escape_latex(&v.position),
            escape_latex(&v.organization),
            escape_latex(&v.location)
        ));
        out.push(format!(
            "      {{{}}}{{{}}}",
            escape_latex(&v.description),
            date_range(&v.start_date, &v.end_date)
        ));
        if i + 1 < items.len() {
            out.push(r"\vspace{5pt}".to_string());
        }
    }
    out.push(r"  \resumeSubHeadingListEnd".to_string());
    out.join("\n")
}

/// Complete document for `sections`.
pub fn render_document(sections: &ResumeSections, author: &Author<'_>) -> String {
    let mut body = vec![heading(&sections.headings, author)];
    if !sections.educations.is_empty() {
        body.push(education(&sections.educations));
    }
    if !sections.experiences.is_empty() {
        body.push(experience(&sections.experiences));
    }
    if !sections.projects.is_empty() {
        body.push(projects(&sections.projects));
    }
    if !sections.skills.is_empty() {
        body.push(skills(&sections.skills));
    }
    if !sections.certifications.is_empty() {
        body.push(certifications(&sections.certifications));
    }
    if !sections.awards.is_empty() {
        body.push(awards(&sections.awards));
    }
    if !sections.volunteers.is_empty() {
        body.push(volunteers(&sections.volunteers));
    }
    format!(
        "{PREAMBLE}\n\\begin{{document}}\n\n{}\n\n\\end{{document}}\n",
        body.join("\n\n")
    )
}
