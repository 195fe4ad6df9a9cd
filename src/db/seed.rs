//! Starter knowledge base loaded on pool init.
//!
//! Gives a fresh session the taxonomy, one fully-curated problem (clear and
//! unclear paths), the template scripts, and the stub accounts. All inserts
//! are `OR IGNORE` so re-running against an existing file-backed store is a
//! no-op.

use rusqlite::params;

use crate::auth;
use crate::db::models::{
    ClearPath, FaqLevel, Instruction, InstructionType, PrimaryOption, ResultMapping, Script,
    ScriptVariable, SecondaryOption, UnclearPath, VerificationStep,
};
use crate::db::DbPool;
use crate::error::AppError;

pub fn run(pool: &DbPool) -> Result<(), AppError> {
    let conn = pool.get()?;

    seed_users(&conn)?;
    seed_taxonomy(&conn)?;
    seed_scripts(&conn)?;
    seed_problems(&conn)?;

    tracing::debug!("Starter knowledge base seeded");
    Ok(())
}

fn seed_users(conn: &rusqlite::Connection) -> Result<(), AppError> {
    let now = chrono::Utc::now().to_rfc3339();
    let users = [
        ("user-admin", "Admin User", "admin@clearpath.com", "Admin", "admin123"),
        ("user-editor", "Editor User", "editor@clearpath.com", "Editor", "editor123"),
        ("user-agent", "Agent User", "agent@clearpath.com", "Agent", "agent123"),
    ];

    for (id, name, email, role, password) in &users {
        conn.execute(
            "INSERT OR IGNORE INTO users (id, name, email, role, password_digest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, name, email, role, auth::digest(password), now],
        )?;
    }
    Ok(())
}

fn seed_taxonomy(conn: &rusqlite::Connection) -> Result<(), AppError> {
    let categories = [
        ("generalSOP", "General SOP", "الإجراءات العامة", "FileText", "gray",
         "Standard operating procedures and general guidelines",
         "الإجراءات التشغيلية المعيارية والإرشادات العامة", 1),
        ("customerSide", "Customer Side", "جانب العميل", "User", "blue",
         "Customer-related issues and resolutions",
         "المشاكل والحلول المتعلقة بالعملاء", 2),
        ("riderSide", "Rider Side", "جانب السائق", "Car", "green",
         "Rider and delivery-related problems",
         "مشاكل السائقين والتوصيل", 3),
        ("merchantSide", "Merchant Side", "جانب التاجر", "Store", "purple",
         "Merchant and business-related support",
         "دعم التجار والأعمال", 4),
    ];

    for (id, name, name_ar, icon, color, desc, desc_ar, order) in &categories {
        conn.execute(
            "INSERT OR IGNORE INTO categories
             (id, name, name_ar, icon, color, description, description_ar, sort_order, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            params![id, name, name_ar, icon, color, desc, desc_ar, order],
        )?;
    }

    let scenarios = [
        ("orderIssue", "Order Issue", "مشكلة الطلب", "customerSide", "Package", "orange", 1),
        ("nonOrderIssue", "Non-Order Issue", "مشكلة غير متعلقة بالطلب", "customerSide", "AlertCircle", "blue", 2),
        ("pickupIssue", "Pickup Issue", "مشكلة الاستلام", "riderSide", "Truck", "green", 1),
    ];

    for (id, name, name_ar, category_id, icon, color, order) in &scenarios {
        conn.execute(
            "INSERT OR IGNORE INTO scenarios
             (id, name, name_ar, category_id, icon, color, sort_order, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
            params![id, name, name_ar, category_id, icon, color, order],
        )?;
    }

    Ok(())
}

fn seed_scripts(conn: &rusqlite::Connection) -> Result<(), AppError> {
    for script in [payment_declined_script(), cancellation_script()] {
        conn.execute(
            "INSERT OR IGNORE INTO scripts
             (id, title, title_ar, content, content_ar, category, tags, color,
              is_template, variables, created_at, updated_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                script.id,
                script.title,
                script.title_ar,
                script.content,
                script.content_ar,
                script.category,
                serde_json::to_string(&script.tags)?,
                script.color,
                script.is_template as i32,
                serde_json::to_string(&script.variables)?,
                script.created_at,
                script.updated_at,
                script.created_by,
            ],
        )?;
    }
    Ok(())
}

fn seed_problems(conn: &rusqlite::Connection) -> Result<(), AppError> {
    let problems = [payment_problem(), delivery_problem(), login_problem()];

    for p in problems {
        conn.execute(
            "INSERT OR IGNORE INTO problems
             (id, title, title_ar, category_id, scenario_id, priority, status,
              faq_levels, verification_steps, clear_path, unclear_path, tags,
              created_at, updated_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                p.0,  // id
                p.1,  // title
                p.2,  // title_ar
                p.3,  // category_id
                p.4,  // scenario_id
                p.5,  // priority
                p.6,  // status
                serde_json::to_string(&p.7)?,
                serde_json::to_string(&p.8)?,
                p.9.map(|c| serde_json::to_string(&c)).transpose()?,
                p.10.map(|u| serde_json::to_string(&u)).transpose()?,
                serde_json::to_string(&p.11)?,
                p.12, // created_at
                p.13, // updated_at
                p.14, // created_by
            ],
        )?;
    }
    Ok(())
}

type SeedProblem = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Vec<FaqLevel>,
    Vec<VerificationStep>,
    Option<ClearPath>,
    Option<UnclearPath>,
    Vec<&'static str>,
    &'static str,
    &'static str,
    &'static str,
);

fn payment_problem() -> SeedProblem {
    let faq_levels = vec![
        faq("prob-payment-faq1", 1,
            "Is the payment method valid?",
            "هل طريقة الدفع صالحة؟",
            "Check if the card is not expired and has sufficient funds",
            "تحقق من أن البطاقة لم تنته صلاحيتها ولديها أموال كافية",
            true),
        faq("prob-payment-faq2", 2,
            "Has the customer tried different payment methods?",
            "هل جرب العميل طرق دفع مختلفة؟",
            "Suggest trying a different card or payment method like digital wallet",
            "اقترح تجربة بطاقة مختلفة أو طريقة دفع مثل المحفظة الرقمية",
            false),
    ];

    let verification_steps = vec![
        step("prob-payment-v1", "Verify customer payment method", "تحقق من طريقة دفع العميل", 1, true),
        step("prob-payment-v2", "Check transaction history", "تحقق من تاريخ المعاملات", 2, false),
    ];

    let clear_path = ClearPath {
        id: "prob-payment-clear".into(),
        instructions: resolution_instructions("clear"),
        script: Some(payment_declined_script()),
    };

    let primary = [
        ("Technical Issue", "مشكلة تقنية"),
        ("Account Problem", "مشكلة في الحساب"),
        ("Payment Issue", "مشكلة في الدفع"),
        ("Service Quality", "جودة الخدمة"),
        ("Policy Question", "سؤال عن السياسة"),
        ("Other", "أخرى"),
    ];
    let secondary = [("Urgent", "عاجل"), ("Standard", "عادي")];

    let unclear_path = UnclearPath {
        id: "prob-payment-unclear".into(),
        primary_options: primary
            .iter()
            .enumerate()
            .map(|(i, (en, ar))| PrimaryOption {
                id: format!("primary-{}", i + 1),
                label: (*en).into(),
                label_ar: (*ar).into(),
                order: (i + 1) as i32,
            })
            .collect(),
        secondary_options: secondary
            .iter()
            .enumerate()
            .map(|(i, (en, ar))| SecondaryOption {
                id: format!("secondary-{}", i + 1),
                label: (*en).into(),
                label_ar: (*ar).into(),
                order: (i + 1) as i32,
            })
            .collect(),
        // One curated cell: Payment Issue × Urgent. Editors fill the rest
        // through generate_mappings.
        result_mappings: vec![ResultMapping {
            id: "prob-payment-map-3-1".into(),
            primary_option_id: "primary-3".into(),
            secondary_option_id: "secondary-1".into(),
            instructions: resolution_instructions("map"),
            script: Some(payment_declined_script()),
        }],
    };

    (
        "prob-payment",
        "Customer unable to complete payment",
        "العميل غير قادر على إكمال الدفع",
        "customerSide",
        "orderIssue",
        "high",
        "resolved",
        faq_levels,
        verification_steps,
        Some(clear_path),
        Some(unclear_path),
        vec!["payment", "card", "declined"],
        "2024-01-15T00:00:00+00:00",
        "2024-02-01T00:00:00+00:00",
        "user-admin",
    )
}

fn delivery_problem() -> SeedProblem {
    (
        "prob-delivery",
        "Order delivery delayed",
        "تأخير في توصيل الطلب",
        "customerSide",
        "orderIssue",
        "medium",
        "investigating",
        vec![faq("prob-delivery-faq1", 1,
            "What is the current order status?",
            "ما هي حالة الطلب الحالية؟",
            "Check the order tracking system for real-time updates",
            "تحقق من نظام تتبع الطلبات للحصول على التحديثات الفورية",
            true)],
        vec![step("prob-delivery-v1", "Check order tracking status", "تحقق من حالة تتبع الطلب", 1, true)],
        None,
        None,
        vec!["delivery", "delay", "tracking"],
        "2024-01-20T00:00:00+00:00",
        "2024-02-01T00:00:00+00:00",
        "user-editor",
    )
}

fn login_problem() -> SeedProblem {
    (
        "prob-login",
        "Account login issues",
        "مشاكل في تسجيل الدخول للحساب",
        "customerSide",
        "nonOrderIssue",
        "low",
        "resolved",
        vec![faq("prob-login-faq1", 1,
            "Is the customer using the correct email?",
            "هل يستخدم العميل البريد الإلكتروني الصحيح؟",
            "Verify the email address associated with the account",
            "تحقق من عنوان البريد الإلكتروني المرتبط بالحساب",
            true)],
        vec![step("prob-login-v1", "Verify customer email address", "تحقق من عنوان البريد الإلكتروني للعميل", 1, true)],
        None,
        None,
        vec!["login", "account", "password"],
        "2024-01-25T00:00:00+00:00",
        "2024-02-01T00:00:00+00:00",
        "user-admin",
    )
}

fn resolution_instructions(prefix: &str) -> Vec<Instruction> {
    vec![
        Instruction {
            id: format!("{prefix}-ins-1"),
            content: "Verify customer account status and recent activity".into(),
            content_ar: "تحقق من حالة حساب العميل والنشاط الأخير".into(),
            order: 1,
            kind: InstructionType::Action,
        },
        Instruction {
            id: format!("{prefix}-ins-2"),
            content: "Check payment method validity and authorization".into(),
            content_ar: "تحقق من صحة طريقة الدفع والتفويض".into(),
            order: 2,
            kind: InstructionType::Action,
        },
        Instruction {
            id: format!("{prefix}-ins-3"),
            content: "Review order history for similar issues".into(),
            content_ar: "راجع تاريخ الطلبات للمشاكل المماثلة".into(),
            order: 3,
            kind: InstructionType::Info,
        },
    ]
}

fn payment_declined_script() -> Script {
    Script {
        id: "script-payment-declined".into(),
        title: "Payment Failed - Card Declined".into(),
        title_ar: "فشل الدفع - رفض البطاقة".into(),
        content: "Hi [Customer Name],\n\n\
            I understand your payment was declined. Let me help you resolve this issue right away.\n\n\
            First, please check:\n\
            1. Your card details are entered correctly\n\
            2. Your card has sufficient funds\n\
            3. Your card hasn't expired\n\n\
            If everything looks correct, please try:\n\
            - Using a different payment method\n\
            - Contacting your bank to authorize the transaction\n\n\
            Would you like me to send you a secure payment link to try again?\n\n\
            Best regards,\n\
            [Agent Name]"
            .into(),
        content_ar: "مرحباً [اسم العميل]،\n\n\
            أفهم أن دفعتك قد رُفضت. دعني أساعدك في حل هذه المشكلة على الفور.\n\n\
            أولاً، يرجى التحقق من:\n\
            1. تم إدخال تفاصيل بطاقتك بشكل صحيح\n\
            2. بطاقتك لديها أموال كافية\n\
            3. بطاقتك لم تنته صلاحيتها\n\n\
            مع أطيب التحيات،\n\
            [اسم الوكيل]"
            .into(),
        category: "Customer Side".into(),
        tags: vec!["payment".into(), "card".into(), "declined".into()],
        color: Some("blue".into()),
        is_template: true,
        variables: vec![
            variable("customer-name", "Customer Name", "[Customer Name]", "The customer's full name"),
            variable("agent-name", "Agent Name", "[Agent Name]", "The support agent's name"),
        ],
        created_at: "2024-01-10T00:00:00+00:00".into(),
        updated_at: "2024-01-20T00:00:00+00:00".into(),
        created_by: "user-admin".into(),
    }
}

fn cancellation_script() -> Script {
    Script {
        id: "script-cancellation".into(),
        title: "Order Cancellation Request".into(),
        title_ar: "طلب إلغاء الطلب".into(),
        content: "Hello [Customer Name],\n\n\
            I've received your request to cancel order #[ORDER_ID].\n\n\
            I've successfully processed your cancellation and:\n\
            - Your refund of [AMOUNT] will be processed within 3-5 business days\n\
            - You'll receive a confirmation email shortly\n\
            - The charge will be reversed to your original card\n\n\
            Is there anything else I can help you with today?\n\n\
            Thank you for choosing our service.\n\n\
            Best regards,\n\
            [Agent Name]"
            .into(),
        content_ar: "مرحباً [اسم العميل]،\n\n\
            لقد تلقيت طلبك لإلغاء الطلب رقم [رقم الطلب].\n\n\
            لقد قمت بمعالجة الإلغاء بنجاح.\n\n\
            شكراً لاختيارك خدمتنا.\n\n\
            مع أطيب التحيات،\n\
            [اسم الوكيل]"
            .into(),
        category: "General SOP".into(),
        tags: vec!["cancellation".into(), "refund".into(), "order".into()],
        color: Some("green".into()),
        is_template: true,
        variables: vec![
            variable("customer-name", "Customer Name", "[Customer Name]", "The customer's full name"),
            variable("order-id", "Order ID", "[ORDER_ID]", "The order identification number"),
            variable("amount", "Refund Amount", "[AMOUNT]", "The refund amount"),
            variable("agent-name", "Agent Name", "[Agent Name]", "The support agent's name"),
        ],
        created_at: "2024-01-12T00:00:00+00:00".into(),
        updated_at: "2024-01-22T00:00:00+00:00".into(),
        created_by: "user-editor".into(),
    }
}

fn faq(id: &str, level: i32, q: &str, q_ar: &str, a: &str, a_ar: &str, required: bool) -> FaqLevel {
    FaqLevel {
        id: id.into(),
        level,
        question: q.into(),
        question_ar: q_ar.into(),
        answer: a.into(),
        answer_ar: a_ar.into(),
        is_required: required,
    }
}

fn step(id: &str, text: &str, text_ar: &str, order: i32, required: bool) -> VerificationStep {
    VerificationStep {
        id: id.into(),
        step: text.into(),
        step_ar: text_ar.into(),
        order,
        is_required: required,
    }
}

fn variable(id: &str, name: &str, placeholder: &str, description: &str) -> ScriptVariable {
    ScriptVariable {
        id: id.into(),
        name: name.into(),
        placeholder: placeholder.into(),
        description: description.into(),
        is_required: true,
    }
}
