//! Static catalog: badges, lessons and cohort personas
//!
//! Read-only reference data. Nothing in the core mutates it.

use crate::models::{Badge, Cohort, Lesson};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Awarded for scoring at least two thirds on a multi-question quiz
pub const QUIZ_BADGE: &str = "quiz_whiz";

pub const QUIZ_TOPICS: &[&str] = &["Saving", "Budgeting", "Understanding Credit", "Investing Basics"];

/// Categories the suggestion service may choose from
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food & Drinks",
    "Shopping",
    "Transport",
    "Bills",
    "Entertainment",
    "Health",
    "Other",
];

/// Applied at commit time when no suggestion has settled
pub const FALLBACK_CATEGORY: &str = "Other";

const BADGES: &[Badge] = &[
    Badge { id: "budget_master", name: "Budget Master", description: "Completed the first budgeting lesson." },
    Badge { id: "saving_pro", name: "Saving Pro", description: "Completed the lesson on Saving vs. Investing." },
    Badge { id: "smart_spender", name: "Smart Spender", description: "Completed the lesson on Needs vs. Wants." },
    Badge { id: "interest_genius", name: "Interest Genius", description: "Completed the lesson on Compound Interest." },
    Badge { id: "goal_getter", name: "Goal Getter", description: "Completed the lesson on setting SMART goals." },
    Badge { id: "paycheck_pro", name: "Paycheck Pro", description: "Completed the lesson on understanding your first paycheck." },
    Badge { id: "credit_builder", name: "Credit Builder", description: "Used the credit score simulator to learn about improving your score." },
    Badge { id: "loan_savvy", name: "Loan Savvy", description: "Used the AI Loan Predictor for the first time." },
    Badge { id: "investment_initiate", name: "Investment Initiate", description: "Explored the investment portfolio to start your journey." },
    Badge { id: "retirement_ready", name: "Retirement Ready", description: "Reviewed the retirement and pension planner." },
    Badge { id: QUIZ_BADGE, name: "Quiz Whiz", description: "Scored high on a financial literacy quiz." },
    Badge { id: "family_budget_planner", name: "Family Planner", description: "Used the Family Budgeting tool to add a shared expense." },
    Badge { id: "withdrawal_planner_user", name: "Withdrawal Planner", description: "Used the AI Retirement Withdrawal Planner." },
    Badge { id: "health_score_checker", name: "Health Checker", description: "Used the AI Financial Health Score tool." },
    Badge { id: "tax_savvy", name: "Tax Savvy", description: "Used the AI Tax Estimator." },
    Badge { id: "budget_optimizer", name: "Budget Optimizer", description: "Used the AI Budget Optimizer." },
];

const LESSONS: &[Lesson] = &[
    Lesson {
        id: "budgeting_101",
        title: "Lesson 1: Budgeting Basics",
        quiz_topic: "budgeting for teens",
        badge_to_award: "budget_master",
        content: &[
            "Budgeting sounds complicated, but it's just a plan for your money. Think of it like a roadmap for your cash.",
            "Start by knowing your income (money you get) and expenses (money you spend).",
            "A popular rule is 50/30/20: 50% for needs, 30% for wants and 20% for savings.",
            "Try the Pocket Planner below: add a few things you'd buy and watch your balance.",
        ],
    },
    Lesson {
        id: "saving_investing",
        title: "Lesson 2: Saving vs. Investing",
        quiz_topic: "saving and investing for teens",
        badge_to_award: "saving_pro",
        content: &[
            "Saving and investing are not the same thing.",
            "Saving is for short-term goals. It's low-risk, but the money doesn't grow much.",
            "Investing is for long-term goals. It carries more risk, but compound growth can make it worth much more.",
            "A good strategy uses both: savings for safety, investments for the future.",
        ],
    },
    Lesson {
        id: "needs_vs_wants",
        title: "Lesson 3: Needs vs. Wants",
        quiz_topic: "differentiating needs and wants",
        badge_to_award: "smart_spender",
        content: &[
            "Knowing the difference between needs and wants is the secret to taking control of your money.",
            "A need is something you must have to live: food, water, shelter, basic clothes.",
            "A want is everything else: games, designer sneakers, pizza with friends.",
            "Smart budgeting covers needs first, then plans for the wants you care about most.",
        ],
    },
    Lesson {
        id: "compound_interest",
        title: "Lesson 4: The Power of Compound Interest",
        quiz_topic: "compound interest",
        badge_to_award: "interest_genius",
        content: &[
            "Compound interest is how money grows all by itself.",
            "You earn interest on your original money plus the interest you've already earned.",
            "It snowballs. The earlier you start, the bigger the snowball gets.",
            "That's why even small, early investments matter for long-term goals.",
        ],
    },
    Lesson {
        id: "smart_goals",
        title: "Lesson 5: Setting SMART Financial Goals",
        quiz_topic: "setting SMART financial goals",
        badge_to_award: "goal_getter",
        content: &[
            "'I want to save money' is too vague. SMART goals work better.",
            "Specific, Measurable, Achievable, Relevant and Time-bound.",
            "'I will save ₹5,000 a month to buy a ₹50,000 console in 10 months' is a SMART goal.",
        ],
    },
    Lesson {
        id: "first_paycheck",
        title: "Lesson 6: Understanding Your First Paycheck",
        quiz_topic: "understanding a paycheck stub",
        badge_to_award: "paycheck_pro",
        content: &[
            "Gross pay is everything you earned before anything is taken out.",
            "Deductions are the amounts taken out, mostly taxes.",
            "Net pay is what lands in your account. Budget on net pay, not gross pay.",
        ],
    },
];

/// Persona and greeting for one cohort
#[derive(Debug, Clone, Copy)]
pub struct CohortProfile {
    pub title: &'static str,
    pub range: &'static str,
    /// System instruction for every chat turn in this cohort
    pub directive: &'static str,
    pub welcome: &'static str,
}

lazy_static! {
    static ref BADGE_INDEX: HashMap<&'static str, &'static Badge> =
        BADGES.iter().map(|b| (b.id, b)).collect();
}

pub fn badges() -> &'static [Badge] {
    BADGES
}

pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGE_INDEX.get(id).copied()
}

pub fn lessons() -> &'static [Lesson] {
    LESSONS
}

pub fn lesson(id: &str) -> Option<&'static Lesson> {
    LESSONS.iter().find(|l| l.id == id)
}

pub fn is_expense_category(category: &str) -> bool {
    EXPENSE_CATEGORIES.contains(&category)
}

pub fn cohort_profile(cohort: Cohort) -> CohortProfile {
    match cohort {
        Cohort::Teen => CohortProfile {
            title: "Teen",
            range: "13-18 years",
            directive: "You are a friendly, cool, and helpful financial coach for teenagers. Use simple language, emojis, and relatable examples (like saving for a video game or first car). Explain concepts like budgeting, saving, and needs vs. wants. Keep your answers concise and encouraging.",
            welcome: "Hi there! I'm your financial buddy. 😊 Ask me anything about saving, pocket money, or what 'inflation' means! Let's make learning about money fun. 🚀",
        },
        Cohort::YoungAdult => CohortProfile {
            title: "Young Adult",
            range: "18-25 years",
            directive: "You are a knowledgeable and supportive financial advisor for young adults. Focus on topics like building credit, managing student loans, creating a 50/30/20 budget, and starting to invest. Be clear, practical, and provide actionable steps.",
            welcome: "Welcome! I'm your financial coach, here to help you navigate topics like building credit, managing student loans, or creating your first real budget. What's on your mind? 👨‍🎓",
        },
        Cohort::Adult => CohortProfile {
            title: "Adult",
            range: "25-60 years",
            directive: "You are an expert financial planner for adults. Address more complex topics like mortgages, retirement savings, investment strategies, and family financial planning. Provide detailed, data-driven advice and sophisticated explanations.",
            welcome: "Hello. As your expert financial planner, I can provide insights on complex topics like mortgages, retirement planning, and investment strategies. How can I assist with your wealth-building journey today? 📈",
        },
        Cohort::Senior => CohortProfile {
            title: "Senior",
            range: "60+ years",
            directive: "You are a patient and trustworthy financial guide for seniors. Focus on retirement income, pension planning, healthcare costs, and fraud prevention. Use clear, large-text-friendly language. Be empathetic and focus on security and peace of mind.",
            welcome: "Greetings. I am your trusted financial guide, here to offer support with retirement income, healthcare costs, and fraud prevention. Please feel free to ask any questions. Your security is my priority. 🛡️",
        },
    }
}
